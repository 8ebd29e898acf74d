//! Built-in EDM primitive types.
//!
//! This module defines [`EdmPrimitiveTypeKind`], the closed set of primitive types every CSDL
//! model can refer to through the reserved `Edm` namespace, together with the implicit
//! promotion rules used by the expression type checker.
//!
//! # Promotion
//!
//! A value of one primitive kind may be used where another kind is expected if it *promotes*
//! to it. Promotion is reflexive and covers numeric widening, spatial subtypes widening to
//! their abstract family type, and every primitive widening to the abstract
//! `Edm.PrimitiveType`.
//!
//! ```rust
//! use edmscope::edm::EdmPrimitiveTypeKind;
//!
//! assert!(EdmPrimitiveTypeKind::Int32.promotes_to(EdmPrimitiveTypeKind::Int64));
//! assert!(EdmPrimitiveTypeKind::Single.promotes_to(EdmPrimitiveTypeKind::Double));
//! assert!(!EdmPrimitiveTypeKind::Int64.promotes_to(EdmPrimitiveTypeKind::Int32));
//! ```

use std::fmt;

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// The reserved namespace of all built-in types.
pub const EDM_NAMESPACE: &str = "Edm";

/// Qualified name of the abstract untyped type.
pub const EDM_UNTYPED: &str = "Edm.Untyped";

/// The kinds of primitive types defined by the EDM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum EdmPrimitiveTypeKind {
    /// Abstract base of all primitive types
    PrimitiveType,
    /// Binary data
    Binary,
    /// Binary-valued logic
    Boolean,
    /// Unsigned 8-bit integer
    Byte,
    /// Date without a time-zone offset
    Date,
    /// Date and time with a time-zone offset
    DateTimeOffset,
    /// Numeric value with fixed precision and scale
    Decimal,
    /// IEEE 754 binary64 floating-point number
    Double,
    /// Signed duration in days, hours, minutes and seconds
    Duration,
    /// 16-byte unique identifier
    Guid,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Signed 8-bit integer
    SByte,
    /// IEEE 754 binary32 floating-point number
    Single,
    /// Binary data stream
    Stream,
    /// Sequence of characters
    String,
    /// Clock time 00:00-23:59:59.999999999999
    TimeOfDay,
    /// Abstract base of all geography types
    Geography,
    /// Point in a round-earth coordinate system
    GeographyPoint,
    /// Line string in a round-earth coordinate system
    GeographyLineString,
    /// Polygon in a round-earth coordinate system
    GeographyPolygon,
    /// Collection of points in a round-earth coordinate system
    GeographyMultiPoint,
    /// Collection of line strings in a round-earth coordinate system
    GeographyMultiLineString,
    /// Collection of polygons in a round-earth coordinate system
    GeographyMultiPolygon,
    /// Collection of arbitrary geography values
    GeographyCollection,
    /// Abstract base of all geometry types
    Geometry,
    /// Point in a flat-earth coordinate system
    GeometryPoint,
    /// Line string in a flat-earth coordinate system
    GeometryLineString,
    /// Polygon in a flat-earth coordinate system
    GeometryPolygon,
    /// Collection of points in a flat-earth coordinate system
    GeometryMultiPoint,
    /// Collection of line strings in a flat-earth coordinate system
    GeometryMultiLineString,
    /// Collection of polygons in a flat-earth coordinate system
    GeometryMultiPolygon,
    /// Collection of arbitrary geometry values
    GeometryCollection,
}

impl EdmPrimitiveTypeKind {
    /// The simple name of the kind, without the `Edm` namespace.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EdmPrimitiveTypeKind::PrimitiveType => "PrimitiveType",
            EdmPrimitiveTypeKind::Binary => "Binary",
            EdmPrimitiveTypeKind::Boolean => "Boolean",
            EdmPrimitiveTypeKind::Byte => "Byte",
            EdmPrimitiveTypeKind::Date => "Date",
            EdmPrimitiveTypeKind::DateTimeOffset => "DateTimeOffset",
            EdmPrimitiveTypeKind::Decimal => "Decimal",
            EdmPrimitiveTypeKind::Double => "Double",
            EdmPrimitiveTypeKind::Duration => "Duration",
            EdmPrimitiveTypeKind::Guid => "Guid",
            EdmPrimitiveTypeKind::Int16 => "Int16",
            EdmPrimitiveTypeKind::Int32 => "Int32",
            EdmPrimitiveTypeKind::Int64 => "Int64",
            EdmPrimitiveTypeKind::SByte => "SByte",
            EdmPrimitiveTypeKind::Single => "Single",
            EdmPrimitiveTypeKind::Stream => "Stream",
            EdmPrimitiveTypeKind::String => "String",
            EdmPrimitiveTypeKind::TimeOfDay => "TimeOfDay",
            EdmPrimitiveTypeKind::Geography => "Geography",
            EdmPrimitiveTypeKind::GeographyPoint => "GeographyPoint",
            EdmPrimitiveTypeKind::GeographyLineString => "GeographyLineString",
            EdmPrimitiveTypeKind::GeographyPolygon => "GeographyPolygon",
            EdmPrimitiveTypeKind::GeographyMultiPoint => "GeographyMultiPoint",
            EdmPrimitiveTypeKind::GeographyMultiLineString => "GeographyMultiLineString",
            EdmPrimitiveTypeKind::GeographyMultiPolygon => "GeographyMultiPolygon",
            EdmPrimitiveTypeKind::GeographyCollection => "GeographyCollection",
            EdmPrimitiveTypeKind::Geometry => "Geometry",
            EdmPrimitiveTypeKind::GeometryPoint => "GeometryPoint",
            EdmPrimitiveTypeKind::GeometryLineString => "GeometryLineString",
            EdmPrimitiveTypeKind::GeometryPolygon => "GeometryPolygon",
            EdmPrimitiveTypeKind::GeometryMultiPoint => "GeometryMultiPoint",
            EdmPrimitiveTypeKind::GeometryMultiLineString => "GeometryMultiLineString",
            EdmPrimitiveTypeKind::GeometryMultiPolygon => "GeometryMultiPolygon",
            EdmPrimitiveTypeKind::GeometryCollection => "GeometryCollection",
        }
    }

    /// The qualified name of the kind, e.g. `Edm.Int32`.
    #[must_use]
    pub fn qualified_name(self) -> String {
        format!("{EDM_NAMESPACE}.{}", self.name())
    }

    /// Look up a primitive kind by its qualified name (`Edm.Int32`).
    ///
    /// Returns `None` for anything outside the `Edm` namespace or for unknown names.
    #[must_use]
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix(EDM_NAMESPACE)?.strip_prefix('.')?;
        Self::iter().find(|kind| kind.name() == simple)
    }

    /// Returns `true` for Byte, SByte, Int16, Int32 and Int64.
    #[must_use]
    pub fn is_integral(self) -> bool {
        self.integral_range().is_some()
    }

    /// Returns `true` for Single and Double.
    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, EdmPrimitiveTypeKind::Single | EdmPrimitiveTypeKind::Double)
    }

    /// Returns `true` for all Geography and Geometry kinds, including the abstract bases.
    #[must_use]
    pub fn is_spatial(self) -> bool {
        self.is_geography() || self.is_geometry()
    }

    /// Returns `true` for Geography and its subtypes.
    #[must_use]
    pub fn is_geography(self) -> bool {
        matches!(
            self,
            EdmPrimitiveTypeKind::Geography
                | EdmPrimitiveTypeKind::GeographyPoint
                | EdmPrimitiveTypeKind::GeographyLineString
                | EdmPrimitiveTypeKind::GeographyPolygon
                | EdmPrimitiveTypeKind::GeographyMultiPoint
                | EdmPrimitiveTypeKind::GeographyMultiLineString
                | EdmPrimitiveTypeKind::GeographyMultiPolygon
                | EdmPrimitiveTypeKind::GeographyCollection
        )
    }

    /// Returns `true` for Geometry and its subtypes.
    #[must_use]
    pub fn is_geometry(self) -> bool {
        matches!(
            self,
            EdmPrimitiveTypeKind::Geometry
                | EdmPrimitiveTypeKind::GeometryPoint
                | EdmPrimitiveTypeKind::GeometryLineString
                | EdmPrimitiveTypeKind::GeometryPolygon
                | EdmPrimitiveTypeKind::GeometryMultiPoint
                | EdmPrimitiveTypeKind::GeometryMultiLineString
                | EdmPrimitiveTypeKind::GeometryMultiPolygon
                | EdmPrimitiveTypeKind::GeometryCollection
        )
    }

    /// The inclusive value range of an integral kind.
    #[must_use]
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            EdmPrimitiveTypeKind::Byte => Some((0, i64::from(u8::MAX))),
            EdmPrimitiveTypeKind::SByte => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            EdmPrimitiveTypeKind::Int16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            EdmPrimitiveTypeKind::Int32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            EdmPrimitiveTypeKind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Check whether a value of this kind can be used where `target` is expected.
    ///
    /// ## Arguments
    /// * 'target' - The kind that is expected
    #[must_use]
    pub fn promotes_to(self, target: EdmPrimitiveTypeKind) -> bool {
        use EdmPrimitiveTypeKind::{
            Byte, Decimal, Double, Geography, Geometry, Int16, Int32, Int64, PrimitiveType,
            SByte, Single,
        };

        if self == target || target == PrimitiveType {
            return true;
        }

        match self {
            Byte | SByte => matches!(target, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Int16 => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            Int32 => matches!(target, Int64 | Single | Double | Decimal),
            Int64 => matches!(target, Single | Double | Decimal),
            Single => target == Double,
            kind if kind.is_geography() => target == Geography,
            kind if kind.is_geometry() => target == Geometry,
            _ => false,
        }
    }
}

impl fmt::Display for EdmPrimitiveTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EDM_NAMESPACE}.{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_roundtrip_all_kinds() {
        assert_eq!(EdmPrimitiveTypeKind::iter().count(), EdmPrimitiveTypeKind::COUNT);
        for kind in EdmPrimitiveTypeKind::iter() {
            assert_eq!(
                EdmPrimitiveTypeKind::from_qualified_name(&kind.qualified_name()),
                Some(kind)
            );
        }
    }

    #[test]
    fn test_from_qualified_name_rejects_foreign_names() {
        assert_eq!(EdmPrimitiveTypeKind::from_qualified_name("Int32"), None);
        assert_eq!(EdmPrimitiveTypeKind::from_qualified_name("Edm.Int128"), None);
        assert_eq!(EdmPrimitiveTypeKind::from_qualified_name("Edmx.Int32"), None);
        assert_eq!(EdmPrimitiveTypeKind::from_qualified_name("Sales.String"), None);
    }

    #[test]
    fn test_integral_ranges() {
        assert_eq!(EdmPrimitiveTypeKind::Byte.integral_range(), Some((0, 255)));
        assert_eq!(EdmPrimitiveTypeKind::SByte.integral_range(), Some((-128, 127)));
        assert!(EdmPrimitiveTypeKind::Int64.is_integral());
        assert!(!EdmPrimitiveTypeKind::Decimal.is_integral());
        assert!(!EdmPrimitiveTypeKind::Double.is_integral());
    }

    #[test]
    fn test_numeric_promotion() {
        use EdmPrimitiveTypeKind::*;

        assert!(Byte.promotes_to(Int16));
        assert!(SByte.promotes_to(Decimal));
        assert!(Int16.promotes_to(Double));
        assert!(Int64.promotes_to(Single));
        assert!(Single.promotes_to(Double));

        assert!(!Double.promotes_to(Single));
        assert!(!Int32.promotes_to(Int16));
        assert!(!Byte.promotes_to(SByte));
        assert!(!Decimal.promotes_to(Double));
        assert!(!String.promotes_to(Guid));
    }

    #[test]
    fn test_spatial_promotion() {
        use EdmPrimitiveTypeKind::*;

        assert!(GeographyPoint.promotes_to(Geography));
        assert!(GeometryMultiPolygon.promotes_to(Geometry));
        assert!(!GeographyPoint.promotes_to(Geometry));
        assert!(!Geography.promotes_to(GeographyPoint));
        assert!(GeographyPoint.is_spatial());
        assert!(!Int32.is_spatial());
    }

    #[test]
    fn test_everything_promotes_to_primitive_type() {
        for kind in EdmPrimitiveTypeKind::iter() {
            assert!(kind.promotes_to(EdmPrimitiveTypeKind::PrimitiveType));
        }
        assert!(!EdmPrimitiveTypeKind::PrimitiveType.promotes_to(EdmPrimitiveTypeKind::Int32));
    }
}
