use std::collections::HashMap;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tiff::decoder::ifd::Value;
use tiff::{TiffError, TiffResult};

/// Location value of a key whose value sits in `GeoDoubleParamsTag`.
const GEO_DOUBLE_PARAMS: u16 = 34736;
/// Location value of a key whose value sits in `GeoAsciiParamsTag`.
const GEO_ASCII_PARAMS: u16 = 34737;

#[derive(Clone, Copy, Debug, PartialEq, TryFromPrimitive, IntoPrimitive, Eq, Hash)]
#[repr(u16)]
pub enum GeoKeyTag {
    // Model and raster space
    ModelType = 1024,
    RasterType = 1025,
    Citation = 1026,

    // Geographic CRS
    GeographicType = 2048,
    GeogCitation = 2049,

    // Projected CRS
    ProjectedType = 3072,
    ProjCitation = 3073,
}

/// `GTRasterTypeGeoKey` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum RasterType {
    PixelIsArea = 1,
    PixelIsPoint = 2,
}

/// The subset of the GeoKey directory needed to line tiles up.
///
/// http://docs.opengeospatial.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoKeyDirectory {
    model_type: Option<u16>,
    raster_type: Option<u16>,
    citation: Option<String>,

    geographic_type: Option<u16>,
    geog_citation: Option<String>,

    projected_type: Option<u16>,
    proj_citation: Option<String>,
}

impl GeoKeyDirectory {
    /// Decode the raw `GeoKeyDirectoryTag` shorts, resolving values stored in the double and
    /// ASCII parameter tags. Keys this crate does not track are ignored. Returns `None` when the
    /// directory header is truncated.
    pub fn parse(keys: &[u16], doubles: &[f64], ascii: &str) -> TiffResult<Option<Self>> {
        if keys.len() < 4 {
            return Ok(None);
        }
        let count = keys[3] as usize;
        let mut tag_data = HashMap::with_capacity(count);

        for entry in keys[4..].chunks_exact(4).take(count) {
            let (id, location, value_count, value_offset) =
                (entry[0], entry[1], entry[2] as usize, entry[3] as usize);
            let Ok(tag) = GeoKeyTag::try_from(id) else {
                continue;
            };
            let value = match location {
                0 => Value::Short(entry[3]),
                GEO_DOUBLE_PARAMS => match doubles.get(value_offset) {
                    Some(v) => Value::Double(*v),
                    None => continue,
                },
                GEO_ASCII_PARAMS => {
                    let Some(s) = ascii.get(value_offset..value_offset + value_count) else {
                        continue;
                    };
                    // Strings in GeoAsciiParams are terminated by '|'
                    Value::Ascii(s.trim_end_matches(['|', '\0']).to_string())
                }
                _ => match keys.get(value_offset) {
                    Some(v) => Value::Short(*v),
                    None => continue,
                },
            };
            tag_data.insert(tag, value);
        }

        Self::from_tags(tag_data).map(Some)
    }

    pub(crate) fn from_tags(mut tag_data: HashMap<GeoKeyTag, Value>) -> TiffResult<Self> {
        let mut directory = Self::default();

        tag_data.drain().try_for_each(|(tag, value)| {
            match tag {
                GeoKeyTag::ModelType => directory.model_type = Some(value.into_u16()?),
                GeoKeyTag::RasterType => directory.raster_type = Some(value.into_u16()?),
                GeoKeyTag::Citation => directory.citation = Some(value.into_string()?),
                GeoKeyTag::GeographicType => directory.geographic_type = Some(value.into_u16()?),
                GeoKeyTag::GeogCitation => directory.geog_citation = Some(value.into_string()?),
                GeoKeyTag::ProjectedType => directory.projected_type = Some(value.into_u16()?),
                GeoKeyTag::ProjCitation => directory.proj_citation = Some(value.into_string()?),
            };
            Ok::<_, TiffError>(())
        })?;

        Ok(directory)
    }

    /// EPSG code of the projected CRS, or of the geographic one when there is no projection.
    pub fn epsg_code(&self) -> Option<u16> {
        self.projected_type.or(self.geographic_type)
    }

    /// `GTModelTypeGeoKey`: 1 projected, 2 geographic, 3 geocentric.
    pub fn model_type(&self) -> Option<u16> {
        self.model_type
    }

    pub fn raster_type(&self) -> Option<RasterType> {
        self.raster_type
            .and_then(|value| RasterType::try_from(value).ok())
    }

    pub fn citation(&self) -> Option<&str> {
        self.citation
            .as_deref()
            .or(self.proj_citation.as_deref())
            .or(self.geog_citation.as_deref())
    }
}
