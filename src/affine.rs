/// Six GDAL-ordered coefficients mapping pixel (column, row) to world (x, y):
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * column_rotation + row * pixel_height
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform(f64, f64, f64, f64, f64, f64);

impl GeoTransform {
    pub fn new(
        origin_x: f64,
        pixel_width: f64,
        row_rotation: f64,
        origin_y: f64,
        column_rotation: f64,
        pixel_height: f64,
    ) -> Self {
        Self(
            origin_x,
            pixel_width,
            row_rotation,
            origin_y,
            column_rotation,
            pixel_height,
        )
    }

    /// North-up transform from a corner and pixel size. `pixel_height` is usually negative.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height)
    }

    /// From `ModelPixelScaleTag` (sx, sy, sz) and the first `ModelTiepointTag` (I, J, K, X, Y, Z).
    pub fn from_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        let (sx, sy) = (scale[0], scale[1]);
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        Some(Self::north_up(x - i * sx, y + j * sy, sx, -sy))
    }

    /// From the 4x4 row-major `ModelTransformationTag` matrix.
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }
        Some(Self::new(
            matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
        ))
    }

    pub fn origin_x(&self) -> f64 {
        self.0
    }

    pub fn pixel_width(&self) -> f64 {
        self.1
    }

    pub fn row_rotation(&self) -> f64 {
        self.2
    }

    pub fn origin_y(&self) -> f64 {
        self.3
    }

    pub fn column_rotation(&self) -> f64 {
        self.4
    }

    pub fn pixel_height(&self) -> f64 {
        self.5
    }

    pub fn is_rotated(&self) -> bool {
        self.row_rotation() != 0.0 || self.column_rotation() != 0.0
    }

    /// Pixel width positive, pixel height negative, both finite.
    pub fn is_north_up(&self) -> bool {
        self.pixel_width().is_finite()
            && self.pixel_height().is_finite()
            && self.pixel_width() > 0.0
            && self.pixel_height() < 0.0
    }

    /// Convert a PixelIsPoint transform to the PixelIsArea convention by moving the origin
    /// from the centre of the top-left pixel to its corner.
    pub fn pixel_is_point_to_area(self) -> Self {
        Self(
            self.0 - (self.1 * 0.5 + self.2 * 0.5),
            self.1,
            self.2,
            self.3 - (self.4 * 0.5 + self.5 * 0.5),
            self.4,
            self.5,
        )
    }

    /// True when every scale and rotation term matches `other` bit for bit.
    pub fn same_scale(&self, other: &Self) -> bool {
        self.1.to_bits() == other.1.to_bits()
            && self.2.to_bits() == other.2.to_bits()
            && self.4.to_bits() == other.4.to_bits()
            && self.5.to_bits() == other.5.to_bits()
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.0, self.1, self.2, self.3, self.4, self.5]
    }
}
