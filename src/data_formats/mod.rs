mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}
