pub mod ascii;
pub mod bridge;
pub mod json;
