#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use imgkit_tensor as tensor;

#[doc(inline)]
pub use imgkit_image as image;

#[doc(inline)]
pub use imgkit_process as process;
