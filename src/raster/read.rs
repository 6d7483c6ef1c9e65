use std::{fs::File, io::{BufReader, Read, Seek}, path::Path};

use ndarray::Array2;
use tiff::{decoder::{Decoder, DecodingResult, Limits}, tags::Tag};

use crate::error::RasterError;
use super::{BandRaster, GeoTransform};

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

impl BandRaster {
    /// Load the first sample of a GeoTIFF as band `name`.
    ///
    /// Georeferencing comes from ModelTransformation, or from a
    /// ModelTiepoint + ModelPixelScale pair; the no-data value from GDAL_NODATA.
    pub fn from_geotiff(name: impl Into<String>, path: &Path) -> Result<Self, RasterError> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        // Full scenes can exceed the decoder's default buffer limits.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let transform = read_transform(&mut decoder)
            .ok_or_else(|| RasterError::MissingGeoreference(path.display().to_string()))?;
        let nodata = decoder.get_tag_ascii_string(GDAL_NODATA).ok()
            .and_then(|s| s.trim().trim_end_matches('\0').parse::<f64>().ok());

        let samples = decode_samples(&mut decoder)?;
        let pixels = width as usize * height as usize;
        if pixels == 0 || samples.len() % pixels != 0 {
            return Err(RasterError::Unsupported(format!(
                "{}: {} samples for a {width}x{height} image", path.display(), samples.len(),
            )));
        }

        // Interleaved multi-sample images keep only their first sample.
        let stride = samples.len() / pixels;
        let first = samples.into_iter().step_by(stride).collect::<Vec<_>>();
        let data = Array2::from_shape_vec((height as usize, width as usize), first)
            .map_err(|e| RasterError::Unsupported(e.to_string()))?;

        let raster = Self::new(name, data, transform);
        Ok(match nodata {
            Some(value) => raster.with_nodata(value),
            None => raster,
        })
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    // 4x4 row-major matrix; only the planar terms matter.
    if let Ok(m) = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION) {
        if m.len() >= 8 {
            return Some(GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]));
        }
    }

    // Tiepoint [i, j, k, x, y, z] pins raster position (i, j) to world (x, y).
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    if tiepoint.len() < 6 || scale.len() < 2 { return None }

    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    let (sx, sy) = (scale[0], scale[1]);
    Some(GeoTransform::north_up(x - i * sx, y + j * sy, sx, sy))
}

fn decode_samples<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f64>, RasterError> {
    let samples = match decoder.read_image()? {
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
    };
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use tiff::encoder::{colortype, TiffEncoder};

    use super::*;

    fn write_geotiff(path: &Path, width: u32, height: u32, data: &[f32], nodata: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(width, height).unwrap();
        image.encoder().write_tag(MODEL_PIXEL_SCALE, &[10.0f64, 10.0, 0.0][..]).unwrap();
        image.encoder().write_tag(MODEL_TIEPOINT, &[0.0f64, 0.0, 0.0, 2_600_000.0, 1_200_100.0, 0.0][..]).unwrap();
        if let Some(nodata) = nodata {
            image.encoder().write_tag(GDAL_NODATA, nodata).unwrap();
        }
        image.write_data(data).unwrap();
    }

    #[test]
    fn reads_georeferenced_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("B04.tif");
        let data = (0..12).map(|v| v as f32).collect::<Vec<_>>();
        write_geotiff(&path, 4, 3, &data, Some("-9999"));

        let raster = BandRaster::from_geotiff("red", &path).unwrap();
        assert_eq!(raster.name(), "red");
        assert_eq!(raster.shape(), (3, 4));
        assert_eq!(raster.data()[[2, 1]], 9.0);
        assert_eq!(raster.nodata(), Some(-9999.0));
        assert_eq!(*raster.transform(), GeoTransform::north_up(2_600_000.0, 1_200_100.0, 10.0, 10.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BandRaster::from_geotiff("nir", Path::new("/nonexistent/B08.tif")).unwrap_err();
        assert!(matches!(err, RasterError::Io(_)));
    }

    #[test]
    fn plain_tiff_lacks_georeference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
        encoder.write_image::<colortype::Gray8>(2, 2, &[1, 2, 3, 4]).unwrap();

        let err = BandRaster::from_geotiff("blue", &path).unwrap_err();
        assert!(matches!(err, RasterError::MissingGeoreference(_)));
    }
}
