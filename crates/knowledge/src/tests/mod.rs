//! Cross-module pipeline scenarios run against in-crate fakes.

mod fakes;
