mod account;
mod library;
mod media;

pub use account::*;
pub use library::*;
pub use media::*;
