//! Mock NIfTI-1 volumes.
//!
//! Placeholder images only: a valid 348-byte NIfTI-1 header followed by a
//! small random float32 payload. Enough for downstream pipelines to open the
//! file and agree on its shape; nothing here inspects voxel content beyond
//! the read-back sanity check.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use binrw::{binrw, BinReaderExt, BinWrite};
use ndarray::Array3;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Voxels are written as little-endian float32 (NIfTI datatype 16).
const DT_FLOAT32: i16 = 16;
/// Header (348) + 4-byte extension flag.
const VOX_OFFSET: f32 = 352.0;

/// The fixed-layout NIfTI-1 header. Field order and widths follow the
/// on-disk format; the magic `n+1\0` at offset 344 marks a single-file
/// header+data `.nii`.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct Nifti1Header {
    pub sizeof_hdr: i32,
    data_type: [u8; 10],
    db_name: [u8; 18],
    extents: i32,
    session_error: i16,
    regular: u8,
    dim_info: u8,
    pub dim: [i16; 8],
    intent_p1: f32,
    intent_p2: f32,
    intent_p3: f32,
    intent_code: i16,
    pub datatype: i16,
    pub bitpix: i16,
    slice_start: i16,
    pub pixdim: [f32; 8],
    pub vox_offset: f32,
    scl_slope: f32,
    scl_inter: f32,
    slice_end: i16,
    slice_code: u8,
    xyzt_units: u8,
    cal_max: f32,
    cal_min: f32,
    slice_duration: f32,
    toffset: f32,
    glmax: i32,
    glmin: i32,
    descrip: [u8; 80],
    aux_file: [u8; 24],
    qform_code: i16,
    sform_code: i16,
    quatern_b: f32,
    quatern_c: f32,
    quatern_d: f32,
    qoffset_x: f32,
    qoffset_y: f32,
    qoffset_z: f32,
    srow_x: [f32; 4],
    srow_y: [f32; 4],
    srow_z: [f32; 4],
    intent_name: [u8; 16],
    pub magic: [u8; 4],
}

impl Nifti1Header {
    /// Header for a 3-d float32 volume with 1 mm isotropic voxels.
    pub fn for_shape([nx, ny, nz]: [usize; 3]) -> Self {
        let mut descrip = [0u8; 80];
        descrip[..4].copy_from_slice(b"MOCK");
        Self {
            sizeof_hdr: 348,
            data_type: [0; 10],
            db_name: [0; 18],
            extents: 0,
            session_error: 0,
            regular: b'r',
            dim_info: 0,
            dim: [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1],
            intent_p1: 0.0,
            intent_p2: 0.0,
            intent_p3: 0.0,
            intent_code: 0,
            datatype: DT_FLOAT32,
            bitpix: 32,
            slice_start: 0,
            pixdim: [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            vox_offset: VOX_OFFSET,
            scl_slope: 1.0,
            scl_inter: 0.0,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 10, // mm + s
            cal_max: 0.0,
            cal_min: 0.0,
            slice_duration: 0.0,
            toffset: 0.0,
            glmax: 0,
            glmin: 0,
            descrip,
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.0,
            quatern_c: 0.0,
            quatern_d: 0.0,
            qoffset_x: 0.0,
            qoffset_y: 0.0,
            qoffset_z: 0.0,
            srow_x: [0.0; 4],
            srow_y: [0.0; 4],
            srow_z: [0.0; 4],
            intent_name: [0; 16],
            magic: *b"n+1\0",
        }
    }

    fn voxel_count(&self) -> usize {
        let ndim = self.dim[0].clamp(0, 7) as usize;
        self.dim[1..=ndim].iter().map(|&n| n.max(0) as usize).product()
    }
}

/// A mock image: header plus voxel payload, constructed fresh per emission.
pub struct MockNifti1 {
    pub header: Nifti1Header,
    pub data: Array3<f32>,
}

/// Create a small placeholder volume filled with pseudo-random values.
///
/// The generator is seeded with a constant: rebuilding a tree with identical
/// parameters must overwrite every file with identical bytes.
pub fn mock_nifti1(shape: [usize; 3]) -> MockNifti1 {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x_b1d5);
    MockNifti1 {
        header: Nifti1Header::for_shape(shape),
        data: Array3::from_shape_simple_fn(shape, || rng.gen::<f32>()),
    }
}

/// Write header, extension flag, then voxels. The caller guarantees the
/// parent directory exists.
pub fn save_nifti(image: &MockNifti1, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(Error::io(path))?;
    let mut buf = BufWriter::new(file);
    image
        .header
        .write(&mut buf)
        .map_err(|source| Error::Nifti { path: path.to_path_buf(), source })?;
    // No header extensions
    buf.write_all(&[0u8; 4]).map_err(Error::io(path))?;
    for voxel in image.data.iter() {
        buf.write_all(&voxel.to_le_bytes()).map_err(Error::io(path))?;
    }
    buf.flush().map_err(Error::io(path))?;
    Ok(())
}

/// Read-back sanity check: does `path` hold a plausible mock volume?
///
/// Checks header size, magic, datatype and that the payload length matches
/// the declared dimensions.
pub fn check_nifti(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(Error::io(path))?;
    let total_len = file.metadata().map_err(Error::io(path))?.len();
    let mut buf = BufReader::new(file);
    let header: Nifti1Header = buf
        .read_le()
        .map_err(|source| Error::Nifti { path: path.to_path_buf(), source })?;

    let expected_len = header.vox_offset as u64 + 4 * header.voxel_count() as u64;
    Ok(header.sizeof_hdr == 348
        && header.magic == *b"n+1\0"
        && header.datatype == DT_FLOAT32
        && total_len == expected_len)
}
