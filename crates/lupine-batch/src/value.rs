use serde::{Deserialize, Serialize};

/// A named reference to an image in the image store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
  /// The name of the image.
  pub image_name: String,
}

/// A single override value applied to a node field for one run.
///
/// Serialized untagged: bare JSON strings, integers, and floats map straight
/// to the matching variant, and objects carrying `image_name` map to
/// [`ImageRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchValue {
  Int(i64),
  Float(f64),
  Str(String),
  Image(ImageRef),
}
