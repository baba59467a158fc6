pub mod profile;
pub mod reading;
pub mod reminder;

pub use profile::*;
pub use reading::*;
pub use reminder::*;
