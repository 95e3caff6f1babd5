//! JSON API routes consumed by client-side observers.

pub mod cart;
