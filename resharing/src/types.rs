//! Messages broadcast during a round.
//!
//! Every message is decoded with the committee size `N` so that a receiver rejects any
//! message whose vectors or matrices do not have the expected shape before trusting it.

use crate::proof::VerifierProof;
use bytes::{Buf, BufMut, Bytes};
use std::collections::BTreeMap;
use yoso_codec::{
    Decode, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, Write,
};
use yoso_cryptography::bls12381::{
    nizk::dleq,
    primitives::{
        group::{Scalar, G1},
        matrix::Matrix,
    },
    vss,
};
use zeroize::Zeroize;

/// Length of a hash digest.
pub const DIGEST_LENGTH: usize = 32;

/// A SHA-256 digest.
pub type Digest = [u8; DIGEST_LENGTH];

/// Length of a witness seed (128 bits).
pub const SEED_LENGTH: usize = 16;

/// A witness seed.
pub type Seed = [u8; SEED_LENGTH];

/// Values and blindings of one row of a sharing matrix.
///
/// Used for the row a dealer sends a verifier (`N` entries, one per next holder) and for the
/// values a verifier forwards a next holder (one entry per accepted dealer).
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct Row {
    pub values: Vec<Scalar>,
    pub blindings: Vec<Scalar>,
}

impl Row {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the values followed by the blindings.
    pub fn scalars(&self) -> Vec<Scalar> {
        self.values
            .iter()
            .chain(&self.blindings)
            .copied()
            .collect()
    }

    /// Returns entry `col` as the share of committee member `index`.
    ///
    /// Panics if `col` is out of range.
    pub fn share(&self, col: usize, index: u32) -> vss::Share {
        vss::Share {
            index,
            value: self.values[col],
            blinding: self.blindings[col],
        }
    }
}

impl Write for Row {
    fn write(&self, buf: &mut impl BufMut) {
        for scalar in self.values.iter().chain(&self.blindings) {
            scalar.write(buf);
        }
    }
}

impl EncodeSize for Row {
    fn encode_size(&self) -> usize {
        (self.values.len() + self.blindings.len()) * Scalar::SIZE
    }
}

impl Read for Row {
    /// The number of entries.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, len: &usize) -> Result<Self, CodecError> {
        let values = (0..*len)
            .map(|_| Scalar::read(buf))
            .collect::<Result<Vec<_>, _>>()?;
        let blindings = (0..*len)
            .map(|_| Scalar::read(buf))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values, blindings })
    }
}

/// Configuration for decoding messages.
#[derive(Clone, Copy, Debug)]
pub struct Cfg {
    /// Committee size.
    pub n: usize,
    /// Largest accepted ciphertext.
    pub max_ciphertext: usize,
}

/// Decodes the message of every member of a committee (`None` if absent or malformed).
pub fn decode<T: Read<Cfg = Cfg>>(
    cfg: &Cfg,
    members: &[u32],
    messages: &BTreeMap<u32, Bytes>,
) -> Vec<Option<T>> {
    members
        .iter()
        .map(|party| {
            let message = messages.get(party)?;
            if message.is_empty() {
                return None;
            }
            T::decode_cfg(message.clone(), cfg).ok()
        })
        .collect()
}

fn ciphertexts(buf: &mut impl Buf, cfg: &Cfg) -> Result<Vec<Bytes>, CodecError> {
    Vec::<Bytes>::read_cfg(
        buf,
        &(RangeCfg::exact(cfg.n), RangeCfg::from(..=cfg.max_ciphertext)),
    )
}

/// Broadcast by dealer `i` in the dealing phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dealing {
    /// `ComC[j]`: vector commitment to row `j` of the sharing matrix (`N + 1` entries).
    pub com_c: Vec<G1>,
    /// `ComZ[l]`: Pedersen commitment to first-level share `l`.
    pub com_z: Vec<G1>,
    /// `ComZPrime[l]`: the same share committed under the vector commitment bases `G_l, G_{N+l}`.
    pub com_z_prime: Vec<G1>,
    /// Proof that `ComZ` and `ComZPrime` open to the same values.
    pub proof: dleq::Proof,
    /// `ComS[l][k]`: Pedersen commitment to the share of first-level share `l` held by verifier `k`.
    pub com_s: Matrix<G1>,
    /// `EncVerM[k]`: row `k + 1` sealed to verifier `k`.
    pub enc_ver: Vec<Bytes>,
    /// `EncResM[k]`: row `k + 1` encrypted under the one-time key of verifier `k`.
    pub enc_res: Vec<Bytes>,
    /// `EncEpsK[r]`: the key shares of resolver `r` (one per verifier), sealed to resolver `r`.
    pub enc_eps: Vec<Bytes>,
    /// `HashEps[k][r]`: digest of the key share of resolver `r` for verifier `k`.
    pub hash_eps: Matrix<Digest>,
}

impl Write for Dealing {
    fn write(&self, buf: &mut impl BufMut) {
        self.com_c.write(buf);
        self.com_z.write(buf);
        self.com_z_prime.write(buf);
        self.proof.write(buf);
        self.com_s.write(buf);
        self.enc_ver.write(buf);
        self.enc_res.write(buf);
        self.enc_eps.write(buf);
        self.hash_eps.write(buf);
    }
}

impl EncodeSize for Dealing {
    fn encode_size(&self) -> usize {
        self.com_c.encode_size()
            + self.com_z.encode_size()
            + self.com_z_prime.encode_size()
            + self.proof.encode_size()
            + self.com_s.encode_size()
            + self.enc_ver.encode_size()
            + self.enc_res.encode_size()
            + self.enc_eps.encode_size()
            + self.hash_eps.encode_size()
    }
}

impl Read for Dealing {
    type Cfg = Cfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, CodecError> {
        let n = cfg.n;
        let com_c = Vec::<G1>::read_cfg(buf, &(RangeCfg::exact(n + 1), ()))?;
        let com_z = Vec::<G1>::read_cfg(buf, &(RangeCfg::exact(n), ()))?;
        let com_z_prime = Vec::<G1>::read_cfg(buf, &(RangeCfg::exact(n), ()))?;
        let proof = dleq::Proof::read_cfg(buf, &n)?;
        let com_s = Matrix::<G1>::read_cfg(buf, &(n, n))?;
        let enc_ver = ciphertexts(buf, cfg)?;
        let enc_res = ciphertexts(buf, cfg)?;
        let enc_eps = ciphertexts(buf, cfg)?;
        let hash_eps = Matrix::<Digest>::read_cfg(buf, &(n, n))?;
        Ok(Self {
            com_c,
            com_z,
            com_z_prime,
            proof,
            com_s,
            enc_ver,
            enc_res,
            enc_eps,
            hash_eps,
        })
    }
}

/// Broadcast by verifier `k` in the verification phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    /// `complaints[i]` is set if the row from dealer `i` was missing or invalid.
    pub complaints: Vec<bool>,
    /// Binds the forwarded values to the accepted dealers' `ComC[k + 1]`.
    pub proof: VerifierProof,
    /// `enc_shares[l]`: the accepted dealers' column `l` (as a [Row]) sealed to next holder `l`.
    pub enc_shares: Vec<Bytes>,
}

impl Verification {
    /// Returns the dealers that were not complained about, in index order.
    pub fn accepted(&self) -> Vec<u32> {
        self.complaints
            .iter()
            .enumerate()
            .filter(|(_, complaint)| !**complaint)
            .map(|(i, _)| i as u32)
            .collect()
    }
}

impl Write for Verification {
    fn write(&self, buf: &mut impl BufMut) {
        self.complaints.write(buf);
        self.proof.write(buf);
        self.enc_shares.write(buf);
    }
}

impl EncodeSize for Verification {
    fn encode_size(&self) -> usize {
        self.complaints.encode_size() + self.proof.encode_size() + self.enc_shares.encode_size()
    }
}

impl Read for Verification {
    type Cfg = Cfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, CodecError> {
        let complaints = Vec::<bool>::read_cfg(buf, &(RangeCfg::exact(cfg.n), ()))?;
        let proof = VerifierProof::read_cfg(buf, &cfg.n)?;
        let enc_shares = ciphertexts(buf, cfg)?;
        Ok(Self {
            complaints,
            proof,
            enc_shares,
        })
    }
}

/// A resolver's key share for the row dealer `dealer` sent verifier `verifier`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reveal {
    pub dealer: u32,
    pub verifier: u32,
    pub share: Scalar,
}

impl Write for Reveal {
    fn write(&self, buf: &mut impl BufMut) {
        self.dealer.write(buf);
        self.verifier.write(buf);
        self.share.write(buf);
    }
}

impl Read for Reveal {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        Ok(Self {
            dealer: u32::read(buf)?,
            verifier: u32::read(buf)?,
            share: Scalar::read(buf)?,
        })
    }
}

impl FixedSize for Reveal {
    const SIZE: usize = 2 * u32::SIZE + Scalar::SIZE;
}

/// Broadcast by each resolver in the resolution phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub reveals: Vec<Reveal>,
}

impl Write for Resolution {
    fn write(&self, buf: &mut impl BufMut) {
        self.reveals.write(buf);
    }
}

impl EncodeSize for Resolution {
    fn encode_size(&self) -> usize {
        self.reveals.encode_size()
    }
}

impl Read for Resolution {
    type Cfg = Cfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, CodecError> {
        let n = cfg.n;
        let reveals = Vec::<Reveal>::read_cfg(buf, &(RangeCfg::from(..=n * n), ()))?;
        for reveal in &reveals {
            if reveal.dealer as usize >= n || reveal.verifier as usize >= n {
                return Err(CodecError::Invalid("Resolution", "index out of range"));
            }
        }
        Ok(Self { reveals })
    }
}

/// Broadcast by each witness in the witness phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    /// `seeds[i]` is set to a seed under which dealer `i` failed the check.
    pub seeds: Vec<Option<Seed>>,
}

impl Write for Witness {
    fn write(&self, buf: &mut impl BufMut) {
        self.seeds.write(buf);
    }
}

impl EncodeSize for Witness {
    fn encode_size(&self) -> usize {
        self.seeds.encode_size()
    }
}

impl Read for Witness {
    type Cfg = Cfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, CodecError> {
        let seeds = Vec::<Option<Seed>>::read_cfg(buf, &(RangeCfg::exact(cfg.n), ()))?;
        Ok(Self { seeds })
    }
}

/// Broadcast by each auditor in the auditing phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Audit {
    /// `qualified[i]` is set if dealer `i` survived the audit.
    pub qualified: Vec<bool>,
}

impl Write for Audit {
    fn write(&self, buf: &mut impl BufMut) {
        self.qualified.write(buf);
    }
}

impl EncodeSize for Audit {
    fn encode_size(&self) -> usize {
        self.qualified.encode_size()
    }
}

impl Read for Audit {
    type Cfg = Cfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, CodecError> {
        let qualified = Vec::<bool>::read_cfg(buf, &(RangeCfg::exact(cfg.n), ()))?;
        Ok(Self { qualified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use yoso_codec::{Decode, Encode};

    const CFG: Cfg = Cfg {
        n: 3,
        max_ciphertext: 64,
    };

    #[test]
    fn test_row() {
        let mut rng = StdRng::seed_from_u64(0);
        let row = Row {
            values: (0..3).map(|_| Scalar::rand(&mut rng)).collect(),
            blindings: (0..3).map(|_| Scalar::rand(&mut rng)).collect(),
        };
        assert_eq!(row.scalars().len(), 6);
        assert_eq!(row.scalars()[3], row.blindings[0]);
        let share = row.share(1, 7);
        assert_eq!(share.index, 7);
        assert_eq!(share.value, row.values[1]);

        let encoded = row.encode();
        assert_eq!(encoded.len(), 6 * Scalar::SIZE);
        assert_eq!(Row::decode_cfg(encoded.clone(), &3).unwrap(), row);
        assert!(matches!(
            Row::decode_cfg(encoded, &2),
            Err(CodecError::ExtraData(_))
        ));
    }

    #[test]
    fn test_shapes_enforced() {
        let audit = Audit {
            qualified: vec![true, false],
        };
        assert!(matches!(
            Audit::decode_cfg(audit.encode(), &CFG),
            Err(CodecError::InvalidLength(2))
        ));

        let witness = Witness {
            seeds: vec![None, Some([7; SEED_LENGTH]), None],
        };
        assert_eq!(Witness::decode_cfg(witness.encode(), &CFG).unwrap(), witness);
    }

    #[test]
    fn test_reveal_out_of_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let resolution = Resolution {
            reveals: vec![Reveal {
                dealer: 3,
                verifier: 0,
                share: Scalar::rand(&mut rng),
            }],
        };
        assert!(matches!(
            Resolution::decode_cfg(resolution.encode(), &CFG),
            Err(CodecError::Invalid(_, _))
        ));
        assert_eq!(
            Resolution::decode_cfg(Resolution::default().encode(), &CFG).unwrap(),
            Resolution::default()
        );
    }

    #[test]
    fn test_decode_members() {
        let audit = Audit {
            qualified: vec![true, false, true],
        };
        let messages = BTreeMap::from([
            (4, Bytes::from(audit.encode())),
            (5, Bytes::new()),
            (6, Bytes::from_static(b"garbage")),
        ]);
        let decoded = decode::<Audit>(&CFG, &[6, 4, 5, 7], &messages);
        assert_eq!(decoded, vec![None, Some(audit), None, None]);
    }
}
