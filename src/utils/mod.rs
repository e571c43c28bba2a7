pub mod time;

/// Generates a url-safe identifier for a view instance.
pub fn longid() -> String {
    nanoid::nanoid!()
}
