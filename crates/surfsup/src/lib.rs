pub mod climate;
pub mod db;
mod routes;
mod startup;
mod utils;

pub use climate::Climate;
pub use db::*;
pub use routes::*;
pub use startup::*;
pub use utils::*;
