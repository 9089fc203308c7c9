//! Group operations over the BLS12-381 scalar field and the G1 subgroup.
//!
//! This module implements the arithmetic the resharing protocol is built on:
//! scalar field operations, point addition, scalar multiplication, multi-scalar
//! multiplication, and hashing to G1 (used to derive independent generators).
//!
//! # Warning
//!
//! Ensure that points are checked to belong to the G1 subgroup to prevent small subgroup
//! attacks. This is particularly important when handling deserialized points or points
//! received from untrusted sources. This is already taken care of for you if you use the
//! provided [Read] implementation.

use blst::{
    blst_bendian_from_scalar, blst_fr, blst_fr_add, blst_fr_from_scalar, blst_fr_from_uint64,
    blst_fr_inverse, blst_fr_mul, blst_fr_sub, blst_hash_to_g1, blst_keygen_v3, blst_p1,
    blst_p1_add_or_double, blst_p1_affine, blst_p1_cneg, blst_p1_compress, blst_p1_from_affine,
    blst_p1_in_g1, blst_p1_is_equal, blst_p1_is_inf, blst_p1_mult, blst_p1_to_affine,
    blst_p1_uncompress, blst_p1s_mult_pippenger, blst_p1s_mult_pippenger_scratch_sizeof,
    blst_scalar, blst_scalar_fr_check, blst_scalar_from_bendian, blst_scalar_from_fr, limb_t,
    BLS12_381_G1, BLST_ERROR,
};
use bytes::{Buf, BufMut};
use rand::RngCore;
use std::{fmt::Debug, ptr};
use yoso_codec::{Error as CodecError, FixedSize, Read, Write};
use zeroize::Zeroize;

/// An element of a group.
pub trait Element:
    Write + Read<Cfg = ()> + FixedSize + Clone + Eq + PartialEq + Debug + Send + Sync
{
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity.
    fn one() -> Self;

    /// Adds to self in-place.
    fn add(&mut self, rhs: &Self);

    /// Multiplies self in-place.
    fn mul(&mut self, rhs: &Scalar);
}

/// An element of a group that supports message hashing and multi-scalar multiplication.
pub trait Point: Element {
    /// Maps the provided data to a group element under the given domain separation tag.
    fn map(&mut self, dst: &[u8], message: &[u8]);

    /// Computes `sum(scalars[i] * points[i])`.
    ///
    /// Panics if `points` and `scalars` have different lengths.
    fn msm(points: &[Self], scalars: &[Scalar]) -> Self;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Scalar(blst_fr);

/// Length of a serialized scalar.
pub const SCALAR_LENGTH: usize = 32;

/// Number of bits in the scalar field modulus.
const SCALAR_BITS: usize = 255;

/// `R = 2^256 mod q` in little-endian Montgomery form which is equivalent to 1 in little-endian
/// non-Montgomery form.
///
/// mod(2^256, 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001) = 0x1824b159acc5056f998c4fefecbc4ff55884b7fa0003480200000001fffffffe
// Reference: https://github.com/filecoin-project/blstrs/blob/ffbb41d1495d84e40a712583346439924603b49a/src/scalar.rs#L77-L89
const BLST_FR_ONE: Scalar = Scalar(blst_fr {
    l: [
        0x0000_0001_ffff_fffe,
        0x5884_b7fa_0003_4802,
        0x998c_4fef_ecbc_4ff5,
        0x1824_b159_acc5_056f,
    ],
});

#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct G1(blst_p1);

/// Length of a compressed G1 element.
pub const G1_ELEMENT_BYTE_LENGTH: usize = 48;

/// Returns the size in bits of a given blst_scalar (represented in little-endian).
fn bits(scalar: &blst_scalar) -> usize {
    let mut bits: usize = SCALAR_LENGTH * 8;
    for i in scalar.b.iter().rev() {
        let leading = i.leading_zeros();
        bits -= leading as usize;
        if leading < 8 {
            break;
        }
    }
    bits
}

impl Scalar {
    /// Generates a random scalar using the provided RNG.
    pub fn rand<R: RngCore>(rng: &mut R) -> Self {
        // Generate a random 64 byte buffer
        let mut ikm = [0u8; 64];
        rng.fill_bytes(&mut ikm);

        // Generate a scalar from the randomly populated buffer
        let mut ret = blst_fr::default();
        unsafe {
            let mut sc = blst_scalar::default();
            blst_keygen_v3(&mut sc, ikm.as_ptr(), ikm.len(), ptr::null(), 0);
            blst_fr_from_scalar(&mut ret, &sc);
        }
        ikm.zeroize();
        Self(ret)
    }

    /// Returns the scalar corresponding to the provided integer.
    pub fn from_u32(i: u32) -> Self {
        let mut ret = Self::zero();
        ret.set_int(i);
        ret
    }

    /// Returns the evaluation point of a committee member (`index + 1`).
    ///
    /// Evaluation point `0` is reserved for the shared secret.
    pub fn from_index(index: u32) -> Self {
        Self::from_u32(index + 1)
    }

    /// Sets the scalar to be the provided integer.
    pub fn set_int(&mut self, i: u32) {
        // blst requires a buffer of 4 uint64 values. Failure to provide one will
        // result in unexpected behavior (will read past the provided buffer).
        //
        // Reference: https://github.com/supranational/blst/blob/415d4f0e2347a794091836a3065206edfd9c72f3/bindings/blst.h#L102
        let buffer = [i as u64, 0, 0, 0];
        unsafe { blst_fr_from_uint64(&mut self.0, buffer.as_ptr()) };
    }

    /// Computes the inverse of the scalar.
    pub fn inverse(&self) -> Option<Self> {
        if *self == Self::zero() {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe { blst_fr_inverse(&mut ret, &self.0) };
        Some(Self(ret))
    }

    /// Subtracts the provided scalar from self in-place.
    pub fn sub(&mut self, rhs: &Self) {
        unsafe { blst_fr_sub(&mut self.0, &self.0, &rhs.0) }
    }

    /// Negates the scalar in-place.
    pub fn negate(&mut self) {
        let mut ret = Self::zero();
        ret.sub(self);
        *self = ret;
    }

    /// Returns the little-endian blst representation of the scalar.
    fn as_blst_scalar(&self) -> blst_scalar {
        let mut scalar = blst_scalar::default();
        unsafe { blst_scalar_from_fr(&mut scalar, &self.0) };
        scalar
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.l.zeroize();
    }
}

impl Element for Scalar {
    fn zero() -> Self {
        Self(blst_fr::default())
    }

    fn one() -> Self {
        BLST_FR_ONE
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_add(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_mul(&mut self.0, &self.0, &rhs.0);
        }
    }
}

impl Write for Scalar {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; SCALAR_LENGTH];
        let scalar = self.as_blst_scalar();
        unsafe {
            blst_bendian_from_scalar(bytes.as_mut_ptr(), &scalar);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for Scalar {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < SCALAR_LENGTH {
            return Err(CodecError::EndOfBuffer);
        }
        let mut bytes = [0u8; SCALAR_LENGTH];
        buf.copy_to_slice(&mut bytes);
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());
            if !blst_scalar_fr_check(&scalar) {
                return Err(CodecError::Invalid("Scalar", "not in field"));
            }
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Ok(Self(ret))
    }
}

impl FixedSize for Scalar {
    const SIZE: usize = SCALAR_LENGTH;
}

impl G1 {
    /// Negates the point in-place.
    pub fn negate(&mut self) {
        unsafe { blst_p1_cneg(&mut self.0, true) };
    }

    /// Subtracts the provided point from self in-place.
    pub fn sub(&mut self, rhs: &Self) {
        let mut neg = *rhs;
        neg.negate();
        self.add(&neg);
    }

    /// Returns whether the point is the point at infinity.
    pub fn is_zero(&self) -> bool {
        unsafe { blst_p1_is_inf(&self.0) }
    }

    /// Returns the sum of all provided points.
    pub fn sum<'a>(points: impl IntoIterator<Item = &'a Self>) -> Self {
        points.into_iter().fold(Self::zero(), |mut acc, p| {
            acc.add(p);
            acc
        })
    }

    fn as_blst_p1_affine(&self) -> blst_p1_affine {
        let mut affine = blst_p1_affine::default();
        unsafe { blst_p1_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl PartialEq for G1 {
    fn eq(&self, other: &Self) -> bool {
        // Projective coordinates are not unique, so compare via blst
        unsafe { blst_p1_is_equal(&self.0, &other.0) }
    }
}

impl Eq for G1 {}

impl Debug for G1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        write!(f, "G1(")?;
        for b in bytes.iter() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl Element for G1 {
    fn zero() -> Self {
        Self(blst_p1::default())
    }

    fn one() -> Self {
        let mut ret = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut ret, &BLS12_381_G1);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p1_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let scalar = rhs.as_blst_scalar();
        unsafe {
            blst_p1_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }
}

impl Point for G1 {
    fn map(&mut self, dst: &[u8], data: &[u8]) {
        unsafe {
            blst_hash_to_g1(
                &mut self.0,
                data.as_ptr(),
                data.len(),
                dst.as_ptr(),
                dst.len(),
                ptr::null(),
                0,
            );
        }
    }

    fn msm(points: &[Self], scalars: &[Scalar]) -> Self {
        assert_eq!(points.len(), scalars.len(), "mismatched lengths");

        // Skip terms that cannot contribute (pippenger does not handle infinity)
        let zero = Scalar::zero();
        let (affines, blst_scalars): (Vec<_>, Vec<_>) = points
            .iter()
            .zip(scalars.iter())
            .filter(|(point, scalar)| !point.is_zero() && **scalar != zero)
            .map(|(point, scalar)| (point.as_blst_p1_affine(), scalar.as_blst_scalar()))
            .unzip();
        match affines.len() {
            0 => return Self::zero(),
            1 => {
                let mut ret = blst_p1::default();
                unsafe {
                    blst_p1_from_affine(&mut ret, &affines[0]);
                    blst_p1_mult(
                        &mut ret,
                        &ret,
                        blst_scalars[0].b.as_ptr(),
                        bits(&blst_scalars[0]),
                    );
                }
                return Self(ret);
            }
            _ => {}
        }

        // Pippenger takes arrays of pointers
        let point_ptrs: Vec<*const blst_p1_affine> =
            affines.iter().map(|p| p as *const _).collect();
        let scalar_ptrs: Vec<*const u8> = blst_scalars.iter().map(|s| s.b.as_ptr()).collect();
        let mut ret = blst_p1::default();
        unsafe {
            let scratch_size = blst_p1s_mult_pippenger_scratch_sizeof(point_ptrs.len());
            let mut scratch =
                vec![0 as limb_t; scratch_size.div_ceil(std::mem::size_of::<limb_t>())];
            blst_p1s_mult_pippenger(
                &mut ret,
                point_ptrs.as_ptr(),
                point_ptrs.len(),
                scalar_ptrs.as_ptr(),
                SCALAR_BITS,
                scratch.as_mut_ptr(),
            );
        }
        Self(ret)
    }
}

impl Write for G1 {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for G1 {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < G1_ELEMENT_BYTE_LENGTH {
            return Err(CodecError::EndOfBuffer);
        }
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        buf.copy_to_slice(&mut bytes);
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return Err(CodecError::Invalid("G1", "invalid encoding"));
            }
            blst_p1_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p1_is_inf(&ret) {
                return Err(CodecError::Invalid("G1", "infinity"));
            }

            // Verify that the deserialized element is in G1
            if !blst_p1_in_g1(&ret) {
                return Err(CodecError::Invalid("G1", "outside G1"));
            }
        }
        Ok(Self(ret))
    }
}

impl FixedSize for G1 {
    const SIZE: usize = G1_ELEMENT_BYTE_LENGTH;
}
