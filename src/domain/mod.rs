mod fare;
mod money;
mod spot;
mod ticket;
mod vehicle;

pub use fare::*;
pub use money::*;
pub use spot::*;
pub use ticket::*;
pub use vehicle::*;
