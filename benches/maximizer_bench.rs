use criterion::{criterion_group, criterion_main, Criterion};
use gearforge::character::CharacterContext;
use gearforge::config::MaximizerPrefs;
use gearforge::data::GameData;
use gearforge::optimizer::Maximizer;
use gearforge::scorer::Evaluator;
use std::hint::black_box;

fn setup() -> (GameData, CharacterContext) {
    let root = env!("CARGO_MANIFEST_DIR");
    let data = GameData::load_from_file(format!("{}/data/game.json", root))
        .expect("Failed to load game data");
    let ctx = CharacterContext::load_from_file(format!("{}/data/character.json", root))
        .expect("Failed to load character");
    (data, ctx)
}

fn criterion_benchmark(c: &mut Criterion) {
    let (data, ctx) = setup();
    let prefs = MaximizerPrefs::default();
    let expr = "10 item, 1 meat, min 40 hp, -tie";

    c.bench_function("parse expression (+ default tiebreaker)", |b| {
        b.iter(|| Evaluator::parse(black_box("10 item, 1 meat, min 40 hp"), &data, &ctx, &prefs))
    });

    c.bench_function("maximize item+meat", |b| {
        let maximizer = Maximizer::new(&data, &ctx, &prefs);
        b.iter(|| maximizer.maximize(black_box(expr)))
    });

    c.bench_function("maximize with outfits and familiars", |b| {
        let maximizer = Maximizer::new(&data, &ctx, &prefs);
        b.iter(|| maximizer.maximize(black_box("item, switch fairy, switch hatrack")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
