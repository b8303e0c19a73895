pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, muted, section, success, summary_row, timing, warn};
pub use progress::Spinner;
pub use table::level_table;
pub use theme::{theme, Theme};
