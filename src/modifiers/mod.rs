pub mod axis;
pub mod predict;
pub mod vector;

pub use axis::{Axis, AxisArray, BitmapAxis, Element, Flag, FlagSet, Stat};
pub use predict::Predicted;
pub use vector::{ModifierVector, StringMods};
