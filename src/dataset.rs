//! Loading labeled points from IDX files, the format the MNIST handwritten digit database is
//! distributed in.
//!
//! An IDX file starts with a big-endian `u32` magic number whose low byte is the number of
//! dimensions, followed by one big-endian `u32` per dimension and then the raw `u8` data.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{KdKnnError, Result};
use crate::point::Point;

/// Magic number of an IDX file holding a 3-dimensional array of `u8` (images).
pub const IDX_IMAGES_MAGIC: u32 = 0x0000_0803;
/// Magic number of an IDX file holding a 1-dimensional array of `u8` (labels).
pub const IDX_LABELS_MAGIC: u32 = 0x0000_0801;

/// Images read out of an IDX file.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    /// Number of rows in each image
    pub rows: usize,
    /// Number of columns in each image
    pub cols: usize,
    /// Row-major pixels of every image, one after another
    pub pixels: Vec<u8>,
}

impl IdxImages {
    /// Number of pixels in one image.
    pub fn pixels_per_image(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        match self.pixels_per_image() {
            0 => 0,
            n => self.pixels.len() / n,
        }
    }

    /// Whether there are no images.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the pixels of each image.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let n = self.pixels_per_image();
        // zero-sized images have no pixels to chunk
        let pixels = if n == 0 { &[][..] } else { &self.pixels[..] };
        pixels.chunks_exact(n.max(1))
    }
}

/// Parse the big-endian header of an IDX file, returning its dimensions and the data that follows.
fn parse_header(data: &[u8], magic: u32) -> Result<(Vec<usize>, &[u8])> {
    let read_u32 = |offset: usize| -> Result<u32> {
        data.get(offset..offset + 4)
            .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .ok_or_else(|| KdKnnError::InvalidDataset("Truncated IDX header.".to_string()))
    };

    let found = read_u32(0)?;
    if found != magic {
        return Err(KdKnnError::InvalidDataset(format!(
            "Expected IDX magic {:#010x}, found {:#010x}.",
            magic, found
        )));
    }

    let num_dims = (magic & 0xff) as usize;
    let dims = (0..num_dims)
        .map(|i| read_u32(4 + 4 * i).map(|d| d as usize))
        .collect::<Result<Vec<_>>>()?;

    let body = &data[4 + 4 * num_dims..];
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| KdKnnError::InvalidDataset("IDX dimensions overflow.".to_string()))?;
    if body.len() != expected {
        return Err(KdKnnError::InvalidDataset(format!(
            "Header describes {} bytes of data, found {}.",
            expected,
            body.len()
        )));
    }
    Ok((dims, body))
}

/// Read an IDX images file.
pub fn read_idx_images<R: Read>(mut reader: R) -> Result<IdxImages> {
    let mut data = vec![];
    reader.read_to_end(&mut data)?;
    let (dims, body) = parse_header(&data, IDX_IMAGES_MAGIC)?;
    Ok(IdxImages {
        rows: dims[1],
        cols: dims[2],
        pixels: body.to_vec(),
    })
}

/// Read an IDX labels file.
pub fn read_idx_labels<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut data = vec![];
    reader.read_to_end(&mut data)?;
    let (_, body) = parse_header(&data, IDX_LABELS_MAGIC)?;
    Ok(body.to_vec())
}

/// Pair images with their labels, scaling each pixel into `[0, 1]`.
///
/// Each image becomes a point with one coordinate per pixel, so `D` must equal `rows * cols`.
pub fn load_idx<const D: usize, R1: Read, R2: Read>(
    images: R1,
    labels: R2,
) -> Result<Vec<(Point<f64, D>, u8)>> {
    let images = read_idx_images(images)?;
    let labels = read_idx_labels(labels)?;

    if images.pixels_per_image() != D {
        return Err(KdKnnError::DimensionMismatch {
            expected: D,
            found: images.pixels_per_image(),
        });
    }
    if images.len() != labels.len() {
        return Err(KdKnnError::InvalidDataset(format!(
            "Found {} images but {} labels.",
            images.len(),
            labels.len()
        )));
    }

    let data: Vec<_> = images
        .iter()
        .zip(labels)
        .map(|(pixels, label)| {
            let coords = std::array::from_fn(|i| pixels[i] as f64 / 255.0);
            (Point::new(coords), label)
        })
        .collect();
    log::debug!("Loaded {} labeled images of {} pixels", data.len(), D);
    Ok(data)
}

/// Like [`load_idx`], reading from files on disk.
pub fn load_idx_files<const D: usize>(
    images_path: impl AsRef<Path>,
    labels_path: impl AsRef<Path>,
) -> Result<Vec<(Point<f64, D>, u8)>> {
    let images = BufReader::new(File::open(images_path)?);
    let labels = BufReader::new(File::open(labels_path)?);
    load_idx(images, labels)
}
