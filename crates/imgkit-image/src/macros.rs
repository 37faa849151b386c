/// Invoke `$m` once with the full list of scalar pixel accessors.
///
/// Each entry is `(getter, setter, element type, pixel id)`. This list is the
/// only place the supported scalar element types are enumerated; the facade
/// trait, the typed backend and the [`crate::ScalarPixel`] impls all expand from it.
macro_rules! for_each_scalar_accessor {
    ($m:ident) => {
        $m! {
            (get_pixel_as_i8, set_pixel_as_i8, i8, Int8),
            (get_pixel_as_u8, set_pixel_as_u8, u8, UInt8),
            (get_pixel_as_i16, set_pixel_as_i16, i16, Int16),
            (get_pixel_as_u16, set_pixel_as_u16, u16, UInt16),
            (get_pixel_as_i32, set_pixel_as_i32, i32, Int32),
            (get_pixel_as_u32, set_pixel_as_u32, u32, UInt32),
            (get_pixel_as_i64, set_pixel_as_i64, i64, Int64),
            (get_pixel_as_u64, set_pixel_as_u64, u64, UInt64),
            (get_pixel_as_f32, set_pixel_as_f32, f32, Float32),
            (get_pixel_as_f64, set_pixel_as_f64, f64, Float64),
        }
    };
}

/// Invoke `$m` once per (pixel kind, dimension) pair with a registered backend.
macro_rules! for_each_image_type {
    ($m:ident) => {
        $m! {
            (Basic<i8>), (Basic<u8>), (Basic<i16>), (Basic<u16>), (Basic<i32>),
            (Basic<u32>), (Basic<i64>), (Basic<u64>), (Basic<f32>), (Basic<f64>),
            (Vector<i8>), (Vector<u8>), (Vector<i16>), (Vector<u16>), (Vector<i32>),
            (Vector<u32>), (Vector<i64>), (Vector<u64>), (Vector<f32>), (Vector<f64>),
            (Label<u8>), (Label<u16>), (Label<u32>),
        }
    };
}
