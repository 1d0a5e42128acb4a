pub use self::charset::Charset;
pub use self::font::{Font, FontSize};
pub use self::command::{Command, CutMode, HriPosition, QrErrorCorrection, WorkMode, split_u16};
pub use self::image_mode::ImageMode;
pub use self::justification::Justification;

mod charset;
mod command;
mod font;
mod image_mode;
mod justification;
