use std::fmt;

/// Runtime identifier of the pixel type of an image.
///
/// Every supported combination of element type and kind (scalar, vector,
/// label) has a stable integer value, see [`PixelId::value`]. Values 10 and
/// 11 are reserved for complex pixels, which are not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum PixelId {
    /// Not a supported pixel type.
    Unknown = -1,
    /// 8-bit unsigned integer.
    UInt8 = 0,
    /// 8-bit signed integer.
    Int8 = 1,
    /// 16-bit unsigned integer.
    UInt16 = 2,
    /// 16-bit signed integer.
    Int16 = 3,
    /// 32-bit unsigned integer.
    UInt32 = 4,
    /// 32-bit signed integer.
    Int32 = 5,
    /// 64-bit unsigned integer.
    UInt64 = 6,
    /// 64-bit signed integer.
    Int64 = 7,
    /// 32-bit float.
    Float32 = 8,
    /// 64-bit float.
    Float64 = 9,
    /// Vector of 8-bit unsigned integers.
    VectorUInt8 = 12,
    /// Vector of 8-bit signed integers.
    VectorInt8 = 13,
    /// Vector of 16-bit unsigned integers.
    VectorUInt16 = 14,
    /// Vector of 16-bit signed integers.
    VectorInt16 = 15,
    /// Vector of 32-bit unsigned integers.
    VectorUInt32 = 16,
    /// Vector of 32-bit signed integers.
    VectorInt32 = 17,
    /// Vector of 64-bit unsigned integers.
    VectorUInt64 = 18,
    /// Vector of 64-bit signed integers.
    VectorInt64 = 19,
    /// Vector of 32-bit floats.
    VectorFloat32 = 20,
    /// Vector of 64-bit floats.
    VectorFloat64 = 21,
    /// Label map of 8-bit unsigned integers.
    LabelUInt8 = 22,
    /// Label map of 16-bit unsigned integers.
    LabelUInt16 = 23,
    /// Label map of 32-bit unsigned integers.
    LabelUInt32 = 24,
}

impl PixelId {
    /// Every supported pixel id, in value order.
    pub const ALL: [PixelId; 23] = [
        PixelId::UInt8,
        PixelId::Int8,
        PixelId::UInt16,
        PixelId::Int16,
        PixelId::UInt32,
        PixelId::Int32,
        PixelId::UInt64,
        PixelId::Int64,
        PixelId::Float32,
        PixelId::Float64,
        PixelId::VectorUInt8,
        PixelId::VectorInt8,
        PixelId::VectorUInt16,
        PixelId::VectorInt16,
        PixelId::VectorUInt32,
        PixelId::VectorInt32,
        PixelId::VectorUInt64,
        PixelId::VectorInt64,
        PixelId::VectorFloat32,
        PixelId::VectorFloat64,
        PixelId::LabelUInt8,
        PixelId::LabelUInt16,
        PixelId::LabelUInt32,
    ];

    /// The stable integer value of this pixel id.
    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Look up a pixel id by its integer value, `Unknown` if there is none.
    pub fn from_value(value: i32) -> PixelId {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.value() == value)
            .unwrap_or(PixelId::Unknown)
    }

    /// Whether each pixel holds a variable-length vector of components.
    pub const fn is_vector(self) -> bool {
        let v = self.value();
        v >= PixelId::VectorUInt8.value() && v <= PixelId::VectorFloat64.value()
    }

    /// Whether the image is a label map.
    pub const fn is_label(self) -> bool {
        let v = self.value();
        v >= PixelId::LabelUInt8.value() && v <= PixelId::LabelUInt32.value()
    }

    /// Whether each pixel holds a single plain number.
    pub const fn is_scalar(self) -> bool {
        let v = self.value();
        v >= PixelId::UInt8.value() && v <= PixelId::Float64.value()
    }

    /// The scalar pixel id of one component of this pixel type.
    ///
    /// Scalars map to themselves and `Unknown` stays `Unknown`.
    pub const fn component_id(self) -> PixelId {
        match self {
            PixelId::VectorUInt8 | PixelId::LabelUInt8 => PixelId::UInt8,
            PixelId::VectorInt8 => PixelId::Int8,
            PixelId::VectorUInt16 | PixelId::LabelUInt16 => PixelId::UInt16,
            PixelId::VectorInt16 => PixelId::Int16,
            PixelId::VectorUInt32 | PixelId::LabelUInt32 => PixelId::UInt32,
            PixelId::VectorInt32 => PixelId::Int32,
            PixelId::VectorUInt64 => PixelId::UInt64,
            PixelId::VectorInt64 => PixelId::Int64,
            PixelId::VectorFloat32 => PixelId::Float32,
            PixelId::VectorFloat64 => PixelId::Float64,
            other => other,
        }
    }

    /// The vector pixel id whose components are of this scalar type.
    pub const fn vector_of(self) -> PixelId {
        match self {
            PixelId::UInt8 => PixelId::VectorUInt8,
            PixelId::Int8 => PixelId::VectorInt8,
            PixelId::UInt16 => PixelId::VectorUInt16,
            PixelId::Int16 => PixelId::VectorInt16,
            PixelId::UInt32 => PixelId::VectorUInt32,
            PixelId::Int32 => PixelId::VectorInt32,
            PixelId::UInt64 => PixelId::VectorUInt64,
            PixelId::Int64 => PixelId::VectorInt64,
            PixelId::Float32 => PixelId::VectorFloat32,
            PixelId::Float64 => PixelId::VectorFloat64,
            _ => PixelId::Unknown,
        }
    }

    /// Human readable name of the pixel type.
    pub const fn as_str(self) -> &'static str {
        match self {
            PixelId::Unknown => "Unknown pixel id",
            PixelId::UInt8 => "8-bit unsigned integer",
            PixelId::Int8 => "8-bit signed integer",
            PixelId::UInt16 => "16-bit unsigned integer",
            PixelId::Int16 => "16-bit signed integer",
            PixelId::UInt32 => "32-bit unsigned integer",
            PixelId::Int32 => "32-bit signed integer",
            PixelId::UInt64 => "64-bit unsigned integer",
            PixelId::Int64 => "64-bit signed integer",
            PixelId::Float32 => "32-bit float",
            PixelId::Float64 => "64-bit float",
            PixelId::VectorUInt8 => "vector of 8-bit unsigned integer",
            PixelId::VectorInt8 => "vector of 8-bit signed integer",
            PixelId::VectorUInt16 => "vector of 16-bit unsigned integer",
            PixelId::VectorInt16 => "vector of 16-bit signed integer",
            PixelId::VectorUInt32 => "vector of 32-bit unsigned integer",
            PixelId::VectorInt32 => "vector of 32-bit signed integer",
            PixelId::VectorUInt64 => "vector of 64-bit unsigned integer",
            PixelId::VectorInt64 => "vector of 64-bit signed integer",
            PixelId::VectorFloat32 => "vector of 32-bit float",
            PixelId::VectorFloat64 => "vector of 64-bit float",
            PixelId::LabelUInt8 => "label of 8-bit unsigned integer",
            PixelId::LabelUInt16 => "label of 16-bit unsigned integer",
            PixelId::LabelUInt32 => "label of 32-bit unsigned integer",
        }
    }
}

impl fmt::Display for PixelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime identifier of a full image type: pixel id and dimension.
///
/// The value is `pixel_id * 4 + dimension`, so the same pixel id yields a
/// different identifier in 2-D and 3-D.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageTypeId(i32);

impl ImageTypeId {
    /// Combine a pixel id and a dimension.
    pub const fn new(pixel_id: PixelId, dimension: u32) -> Self {
        Self(pixel_id.value() * 4 + dimension as i32)
    }

    /// The stable integer value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// The pixel id part.
    pub fn pixel_id(self) -> PixelId {
        PixelId::from_value(self.0.div_euclid(4))
    }

    /// The dimension part.
    pub const fn dimension(self) -> u32 {
        self.0.rem_euclid(4) as u32
    }
}

impl fmt::Display for ImageTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-D {}", self.dimension(), self.pixel_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_stable() {
        assert_eq!(PixelId::UInt8.value(), 0);
        assert_eq!(PixelId::Float64.value(), 9);
        assert_eq!(PixelId::VectorUInt8.value(), 12);
        assert_eq!(PixelId::LabelUInt32.value(), 24);
        assert_eq!(PixelId::Unknown.value(), -1);
    }

    #[test]
    fn from_value_round_trip() {
        for id in PixelId::ALL {
            assert_eq!(PixelId::from_value(id.value()), id);
        }
        assert_eq!(PixelId::from_value(10), PixelId::Unknown);
        assert_eq!(PixelId::from_value(11), PixelId::Unknown);
        assert_eq!(PixelId::from_value(99), PixelId::Unknown);
    }

    #[test]
    fn kinds_are_disjoint() {
        for id in PixelId::ALL {
            let kinds = [id.is_scalar(), id.is_vector(), id.is_label()];
            assert_eq!(kinds.iter().filter(|k| **k).count(), 1, "{id}");
        }
        assert!(!PixelId::Unknown.is_scalar());
        assert!(!PixelId::Unknown.is_vector());
        assert!(!PixelId::Unknown.is_label());
    }

    #[test]
    fn component_and_vector_ids() {
        assert_eq!(PixelId::VectorFloat32.component_id(), PixelId::Float32);
        assert_eq!(PixelId::LabelUInt16.component_id(), PixelId::UInt16);
        assert_eq!(PixelId::Int32.component_id(), PixelId::Int32);
        assert_eq!(PixelId::Int64.vector_of(), PixelId::VectorInt64);
        assert_eq!(PixelId::LabelUInt8.vector_of(), PixelId::Unknown);
    }

    #[test]
    fn image_type_id_is_distinct_per_dimension() {
        let a = ImageTypeId::new(PixelId::UInt16, 2);
        let b = ImageTypeId::new(PixelId::UInt16, 3);
        assert_ne!(a, b);
        assert_eq!(a.pixel_id(), PixelId::UInt16);
        assert_eq!(b.dimension(), 3);
        assert_eq!(a.to_string(), "2-D 16-bit unsigned integer");
    }
}
