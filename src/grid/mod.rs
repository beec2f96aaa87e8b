pub mod metric;

pub use metric::{CellCoord, GridDistance, GridScale};
