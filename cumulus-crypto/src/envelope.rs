//! The container codec: length header, IV, AES-256-CBC payload.
//!
//! Layout, fixed for compatibility with existing containers:
//!
//! ```text
//! offset 0   8 bytes   original plaintext length, little-endian u64
//! offset 8   16 bytes  initialization vector, fresh random per seal
//! offset 24  n bytes   AES-256-CBC ciphertext
//! ```
//!
//! A final chunk shorter than the block size is right-padded with ASCII
//! spaces before encryption; the length header is what restores the exact
//! plaintext on open, so trailing spaces in the plaintext itself survive.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use std::io::Read;

use crate::error::{CryptoError, CryptoResult};
use crate::key::EnvelopeKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;
/// Initialization vector size in bytes.
pub const IV_SIZE: usize = 16;
/// Total header size: length field plus IV.
pub const HEADER_SIZE: usize = 8 + IV_SIZE;

const PAD_BYTE: u8 = b' ';
/// Plaintext is consumed in chunks of this size; any multiple of
/// [`BLOCK_SIZE`] produces an identical container.
const READ_CHUNK: usize = 4096;

/// Encrypts everything `reader` yields into a self-describing container.
///
/// Memory stays bounded by the chunk size on the input side; the container
/// itself is returned as one buffer. An empty plaintext produces exactly
/// the 24-byte header.
pub fn seal<R: Read>(mut reader: R, key: &EnvelopeKey) -> CryptoResult<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let mut out = Vec::with_capacity(HEADER_SIZE + READ_CHUNK);
    // Length is patched in once the stream is drained.
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&iv);

    let mut enc = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into());
    let mut total: u64 = 0;
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let filled = fill_chunk(&mut reader, &mut buf)?;
        if filled == 0 {
            break;
        }
        total += filled as u64;

        let padded = filled.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        buf[filled..padded].fill(PAD_BYTE);
        for block in buf[..padded].chunks_exact_mut(BLOCK_SIZE) {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        out.extend_from_slice(&buf[..padded]);

        // A partially filled chunk means the reader is drained.
        if filled < READ_CHUNK {
            break;
        }
    }
    out[..8].copy_from_slice(&total.to_le_bytes());
    Ok(out)
}

/// Seals an in-memory plaintext. See [`seal`].
pub fn seal_bytes(plaintext: &[u8], key: &EnvelopeKey) -> CryptoResult<Vec<u8>> {
    seal(plaintext, key)
}

/// Decrypts a container produced by [`seal`], returning the exact original
/// plaintext.
///
/// There is no integrity check: a wrong passphrase or tampered ciphertext
/// yields garbage of the declared length, not an error. Structural errors
/// (short header, misaligned ciphertext, impossible declared length) are
/// reported.
pub fn open(container: &[u8], key: &EnvelopeKey) -> CryptoResult<Vec<u8>> {
    if container.len() < HEADER_SIZE {
        return Err(CryptoError::TruncatedContainer {
            len: container.len(),
        });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&container[..8]);
    let declared = u64::from_le_bytes(len_bytes);

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&container[8..HEADER_SIZE]);

    let ciphertext = &container[HEADER_SIZE..];
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::MisalignedCiphertext {
            len: ciphertext.len(),
        });
    }
    if declared > ciphertext.len() as u64 {
        return Err(CryptoError::LengthMismatch {
            declared,
            available: ciphertext.len() as u64,
        });
    }

    let mut plaintext = ciphertext.to_vec();
    let mut dec = Aes256CbcDec::new(key.as_bytes().into(), (&iv).into());
    for block in plaintext.chunks_exact_mut(BLOCK_SIZE) {
        dec.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    plaintext.truncate(declared as usize);
    Ok(plaintext)
}

/// Reads until `buf` is full or the reader is drained, tolerating short
/// reads in between.
fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> CryptoResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
