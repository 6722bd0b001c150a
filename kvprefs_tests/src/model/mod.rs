pub mod converters;
pub mod custom;
pub mod primitive;
