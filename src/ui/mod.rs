pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{header, timing, warn};
pub use progress::ScanProgress;
pub use table::{route_table, RouteRow, TableBuilder};
pub use theme::{theme, Theme};
