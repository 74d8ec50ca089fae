//! AES block cipher for ciphered voice payloads.
//!
//! A straight FIPS-197 implementation with ECB, CBC, and CFB modes over
//! 128/192/256-bit keys. Round keys are derived per operation and dropped
//! afterwards. The S-boxes and GF(2^8) multiplication tables are materialised
//! at compile time from the standard's definitions.
//!
//! The implementation is table-driven with data-dependent indexing and is
//! therefore not constant-time; deployments that need timing hardening
//! should substitute a hardened core.

use collect_slice::CollectSlice;

use crate::error::{NxdnError, Result};

/// Cipher block size in bytes.
pub const BLOCK_BYTES: usize = 16;

/// Columns in the cipher state.
const NB: usize = 4;

/// Supported key widths.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyLength {
    Aes128,
    Aes192,
    Aes256,
}

impl KeyLength {
    /// Number of 32-bit words in the key.
    fn nk(self) -> usize {
        use self::KeyLength::*;

        match self {
            Aes128 => 4,
            Aes192 => 6,
            Aes256 => 8,
        }
    }

    /// Number of cipher rounds.
    fn nr(self) -> usize {
        use self::KeyLength::*;

        match self {
            Aes128 => 10,
            Aes192 => 12,
            Aes256 => 14,
        }
    }

    /// Key width in bytes.
    pub fn key_bytes(self) -> usize {
        self.nk() * 4
    }
}

/// AES cipher parameterised by key width.
#[derive(Copy, Clone, Debug)]
pub struct Aes {
    nk: usize,
    nr: usize,
}

impl Aes {
    /// Construct a cipher for the given key width.
    pub fn new(len: KeyLength) -> Aes {
        Aes {
            nk: len.nk(),
            nr: len.nr(),
        }
    }

    /// Encrypt in ECB mode, returning the ciphertext.
    pub fn encrypt_ecb(&self, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.check_len(input)?;
        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];

        for (pt, ct) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            self.encrypt_block(pt, ct, &keys);
        }

        Ok(out)
    }

    /// Decrypt in ECB mode, returning the plaintext.
    pub fn decrypt_ecb(&self, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.check_len(input)?;
        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];

        for (ct, pt) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            self.decrypt_block(ct, pt, &keys);
        }

        Ok(out)
    }

    /// Encrypt in CBC mode with the given 16-byte IV.
    pub fn encrypt_cbc(&self, input: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(iv.len(), BLOCK_BYTES);
        self.check_len(input)?;

        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];
        let mut chain = [0u8; BLOCK_BYTES];
        chain.copy_from_slice(iv);

        for (pt, ct) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            let mut block = [0u8; BLOCK_BYTES];
            xor_block(pt, &chain, &mut block);
            self.encrypt_block(&block, ct, &keys);
            chain.copy_from_slice(ct);
        }

        Ok(out)
    }

    /// Decrypt in CBC mode with the given 16-byte IV.
    pub fn decrypt_cbc(&self, input: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(iv.len(), BLOCK_BYTES);
        self.check_len(input)?;

        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];
        let mut chain = [0u8; BLOCK_BYTES];
        chain.copy_from_slice(iv);

        for (ct, pt) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            let mut block = [0u8; BLOCK_BYTES];
            self.decrypt_block(ct, &mut block, &keys);
            xor_block(&block, &chain, pt);
            chain.copy_from_slice(ct);
        }

        Ok(out)
    }

    /// Encrypt in CFB mode with the given 16-byte IV.
    pub fn encrypt_cfb(&self, input: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(iv.len(), BLOCK_BYTES);
        self.check_len(input)?;

        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];
        let mut chain = [0u8; BLOCK_BYTES];
        chain.copy_from_slice(iv);

        for (pt, ct) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            let mut stream = [0u8; BLOCK_BYTES];
            self.encrypt_block(&chain, &mut stream, &keys);
            xor_block(pt, &stream, ct);
            chain.copy_from_slice(ct);
        }

        Ok(out)
    }

    /// Decrypt in CFB mode with the given 16-byte IV.
    ///
    /// CFB decryption runs the block cipher forward over the previous
    /// ciphertext block, never in reverse.
    pub fn decrypt_cfb(&self, input: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(iv.len(), BLOCK_BYTES);
        self.check_len(input)?;

        let keys = self.expand_key(key);
        let mut out = vec![0u8; input.len()];
        let mut chain = [0u8; BLOCK_BYTES];
        chain.copy_from_slice(iv);

        for (ct, pt) in input
            .chunks_exact(BLOCK_BYTES)
            .zip(out.chunks_exact_mut(BLOCK_BYTES))
        {
            let mut stream = [0u8; BLOCK_BYTES];
            self.encrypt_block(&chain, &mut stream, &keys);
            xor_block(ct, &stream, pt);
            chain.copy_from_slice(ct);
        }

        Ok(out)
    }

    fn check_len(&self, input: &[u8]) -> Result<()> {
        if input.len() % BLOCK_BYTES == 0 {
            Ok(())
        } else {
            Err(NxdnError::BlockLength)
        }
    }

    /// Derive the round key schedule: `4 * NB * (nr + 1)` bytes.
    fn expand_key(&self, key: &[u8]) -> Vec<u8> {
        assert_eq!(key.len(), self.nk * 4);

        let mut w = vec![0u8; 4 * NB * (self.nr + 1)];
        w[..key.len()].copy_from_slice(key);

        for i in self.nk..NB * (self.nr + 1) {
            let mut tmp = [0u8; 4];
            tmp.copy_from_slice(&w[4 * (i - 1)..4 * i]);

            if i % self.nk == 0 {
                tmp.rotate_left(1);
                sub_word(&mut tmp);
                tmp[0] ^= RCON[i / self.nk - 1];
            } else if self.nk > 6 && i % self.nk == 4 {
                sub_word(&mut tmp);
            }

            let prev = 4 * (i - self.nk);
            let word: Vec<u8> = (0..4).map(|k| w[prev + k] ^ tmp[k]).collect();
            w[4 * i..4 * i + 4].copy_from_slice(&word);
        }

        w
    }

    /// Encrypt a single 16-byte block.
    fn encrypt_block(&self, input: &[u8], out: &mut [u8], keys: &[u8]) {
        let mut state = load_state(input);

        add_round_key(&mut state, &keys[..4 * NB]);

        for round in 1..self.nr {
            sub_bytes(&mut state);
            shift_rows(&mut state);
            mix_columns(&mut state);
            add_round_key(&mut state, &keys[4 * NB * round..]);
        }

        sub_bytes(&mut state);
        shift_rows(&mut state);
        add_round_key(&mut state, &keys[4 * NB * self.nr..]);

        store_state(&state, out);
    }

    /// Decrypt a single 16-byte block.
    fn decrypt_block(&self, input: &[u8], out: &mut [u8], keys: &[u8]) {
        let mut state = load_state(input);

        add_round_key(&mut state, &keys[4 * NB * self.nr..]);

        for round in (1..self.nr).rev() {
            inv_shift_rows(&mut state);
            inv_sub_bytes(&mut state);
            add_round_key(&mut state, &keys[4 * NB * round..]);
            inv_mix_columns(&mut state);
        }

        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, &keys[..4 * NB]);

        store_state(&state, out);
    }
}

/// Cipher state: 4 rows by NB columns, loaded column-major.
type State = [[u8; NB]; 4];

fn load_state(input: &[u8]) -> State {
    let mut state = [[0u8; NB]; 4];

    for c in 0..NB {
        for r in 0..4 {
            state[r][c] = input[r + 4 * c];
        }
    }

    state
}

fn store_state(state: &State, out: &mut [u8]) {
    for c in 0..NB {
        for r in 0..4 {
            out[r + 4 * c] = state[r][c];
        }
    }
}

fn add_round_key(state: &mut State, keys: &[u8]) {
    for c in 0..NB {
        for r in 0..4 {
            state[r][c] ^= keys[4 * c + r];
        }
    }
}

fn sub_bytes(state: &mut State) {
    for row in state.iter_mut() {
        for byte in row.iter_mut() {
            *byte = SBOX[*byte as usize];
        }
    }
}

fn inv_sub_bytes(state: &mut State) {
    for row in state.iter_mut() {
        for byte in row.iter_mut() {
            *byte = INV_SBOX[*byte as usize];
        }
    }
}

fn shift_rows(state: &mut State) {
    for (r, row) in state.iter_mut().enumerate() {
        row.rotate_left(r);
    }
}

fn inv_shift_rows(state: &mut State) {
    for (r, row) in state.iter_mut().enumerate() {
        row.rotate_right(r);
    }
}

fn mix_columns(state: &mut State) {
    for c in 0..NB {
        let (s0, s1, s2, s3) = (state[0][c], state[1][c], state[2][c], state[3][c]);

        state[0][c] = mul2(s0) ^ mul3(s1) ^ s2 ^ s3;
        state[1][c] = s0 ^ mul2(s1) ^ mul3(s2) ^ s3;
        state[2][c] = s0 ^ s1 ^ mul2(s2) ^ mul3(s3);
        state[3][c] = mul3(s0) ^ s1 ^ s2 ^ mul2(s3);
    }
}

fn inv_mix_columns(state: &mut State) {
    for c in 0..NB {
        let (s0, s1, s2, s3) = (state[0][c], state[1][c], state[2][c], state[3][c]);

        state[0][c] = mul14(s0) ^ mul11(s1) ^ mul13(s2) ^ mul9(s3);
        state[1][c] = mul9(s0) ^ mul14(s1) ^ mul11(s2) ^ mul13(s3);
        state[2][c] = mul13(s0) ^ mul9(s1) ^ mul14(s2) ^ mul11(s3);
        state[3][c] = mul11(s0) ^ mul13(s1) ^ mul9(s2) ^ mul14(s3);
    }
}

fn sub_word(word: &mut [u8; 4]) {
    for byte in word.iter_mut() {
        *byte = SBOX[*byte as usize];
    }
}

fn xor_block(a: &[u8], b: &[u8], out: &mut [u8]) {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x ^ y)
        .collect_slice(out);
}

fn mul2(x: u8) -> u8 {
    GMUL2[x as usize]
}
fn mul3(x: u8) -> u8 {
    GMUL3[x as usize]
}
fn mul9(x: u8) -> u8 {
    GMUL9[x as usize]
}
fn mul11(x: u8) -> u8 {
    GMUL11[x as usize]
}
fn mul13(x: u8) -> u8 {
    GMUL13[x as usize]
}
fn mul14(x: u8) -> u8 {
    GMUL14[x as usize]
}

/// Round constants for key expansion.
const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1B, 0x36];

/// Multiply two elements of GF(2^8) modulo the AES polynomial.
const fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0;
    let mut i = 0;

    while i < 8 {
        if b & 1 != 0 {
            p ^= a;
        }

        let carry = a & 0x80 != 0;
        a <<= 1;

        if carry {
            a ^= 0x1B;
        }

        b >>= 1;
        i += 1;
    }

    p
}

const fn gmul_table(factor: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        table[i] = gmul(i as u8, factor);
        i += 1;
    }

    table
}

const fn rotl(x: u8, n: u32) -> u8 {
    x << n | x >> (8 - n)
}

/// The forward S-box: multiplicative inverse followed by the affine
/// transform, exactly as FIPS-197 defines it.
const fn init_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    table[0] = 0x63;

    let mut i = 1;
    while i < 256 {
        // Brute-force the inverse; this runs once, at compile time.
        let mut inv = 1;
        while gmul(i as u8, inv) != 1 {
            inv += 1;
        }

        table[i] = inv ^ rotl(inv, 1) ^ rotl(inv, 2) ^ rotl(inv, 3) ^ rotl(inv, 4) ^ 0x63;
        i += 1;
    }

    table
}

const fn invert_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        table[sbox[i] as usize] = i as u8;
        i += 1;
    }

    table
}

const SBOX: [u8; 256] = init_sbox();
const INV_SBOX: [u8; 256] = invert_sbox(&SBOX);

const GMUL2: [u8; 256] = gmul_table(2);
const GMUL3: [u8; 256] = gmul_table(3);
const GMUL9: [u8; 256] = gmul_table(9);
const GMUL11: [u8; 256] = gmul_table(11);
const GMUL13: [u8; 256] = gmul_table(13);
const GMUL14: [u8; 256] = gmul_table(14);

#[cfg(test)]
mod test {
    use super::*;
    use super::KeyLength::*;

    #[test]
    fn test_tables() {
        // Spot values from the FIPS-197 S-box.
        assert_eq!(SBOX[0x00], 0x63);
        assert_eq!(SBOX[0x01], 0x7C);
        assert_eq!(SBOX[0x53], 0xED);
        assert_eq!(SBOX[0xFF], 0x16);
        assert_eq!(INV_SBOX[0x63], 0x00);
        assert_eq!(INV_SBOX[0xED], 0x53);

        for i in 0..256 {
            assert_eq!(INV_SBOX[SBOX[i] as usize], i as u8);
            assert_eq!(GMUL2[i], gmul(i as u8, 2));
        }

        assert_eq!(GMUL3[0x57], 0xF9);
        assert_eq!(GMUL2[0x80], 0x1B);
    }

    #[test]
    fn test_fips197_ecb() {
        let plain: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
            0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ];
        let key: Vec<u8> = (0..32).collect();

        // Appendix C.1.
        let ct = Aes::new(Aes128).encrypt_ecb(&plain, &key[..16]).unwrap();
        assert_eq!(
            ct,
            [
                0x69, 0xC4, 0xE0, 0xD8, 0x6A, 0x7B, 0x04, 0x30,
                0xD8, 0xCD, 0xB7, 0x80, 0x70, 0xB4, 0xC5, 0x5A,
            ]
        );
        assert_eq!(
            Aes::new(Aes128).decrypt_ecb(&ct, &key[..16]).unwrap(),
            plain
        );

        // Appendix C.2.
        let ct = Aes::new(Aes192).encrypt_ecb(&plain, &key[..24]).unwrap();
        assert_eq!(
            ct,
            [
                0xDD, 0xA9, 0x7C, 0xA4, 0x86, 0x4C, 0xDF, 0xE0,
                0x6E, 0xAF, 0x70, 0xA0, 0xEC, 0x0D, 0x71, 0x91,
            ]
        );
        assert_eq!(
            Aes::new(Aes192).decrypt_ecb(&ct, &key[..24]).unwrap(),
            plain
        );

        // Appendix C.3.
        let ct = Aes::new(Aes256).encrypt_ecb(&plain, &key[..32]).unwrap();
        assert_eq!(
            ct,
            [
                0x8E, 0xA2, 0xB7, 0xCA, 0x51, 0x67, 0x45, 0xBF,
                0xEA, 0xFC, 0x49, 0x90, 0x4B, 0x49, 0x60, 0x89,
            ]
        );
        assert_eq!(
            Aes::new(Aes256).decrypt_ecb(&ct, &key[..32]).unwrap(),
            plain
        );
    }

    const NIST_KEY: [u8; 16] = [
        0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6,
        0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F, 0x3C,
    ];
    const NIST_IV: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    ];
    const NIST_PLAIN: [u8; 16] = [
        0x6B, 0xC1, 0xBE, 0xE2, 0x2E, 0x40, 0x9F, 0x96,
        0xE9, 0x3D, 0x7E, 0x11, 0x73, 0x93, 0x17, 0x2A,
    ];

    #[test]
    fn test_sp800_38a_cbc() {
        // SP 800-38A Appendix F.2.1, first block.
        let aes = Aes::new(Aes128);
        let ct = aes.encrypt_cbc(&NIST_PLAIN, &NIST_KEY, &NIST_IV).unwrap();

        assert_eq!(
            ct,
            [
                0x76, 0x49, 0xAB, 0xAC, 0x81, 0x19, 0xB2, 0x46,
                0xCE, 0xE9, 0x8E, 0x9B, 0x12, 0xE9, 0x19, 0x7D,
            ]
        );
        assert_eq!(aes.decrypt_cbc(&ct, &NIST_KEY, &NIST_IV).unwrap(), NIST_PLAIN);
    }

    #[test]
    fn test_sp800_38a_cfb() {
        // SP 800-38A Appendix F.3.13, first block.
        let aes = Aes::new(Aes128);
        let ct = aes.encrypt_cfb(&NIST_PLAIN, &NIST_KEY, &NIST_IV).unwrap();

        assert_eq!(
            ct,
            [
                0x3B, 0x3F, 0xD9, 0x2E, 0xB7, 0x2D, 0xAD, 0x20,
                0x33, 0x34, 0x49, 0xF8, 0xE8, 0x3C, 0xFB, 0x4A,
            ]
        );
        assert_eq!(aes.decrypt_cfb(&ct, &NIST_KEY, &NIST_IV).unwrap(), NIST_PLAIN);
    }

    #[test]
    fn test_round_trips() {
        let input: Vec<u8> = (0..64u8).map(|i| i.wrapping_mul(37)).collect();
        let iv: Vec<u8> = (0..16).map(|i| 0xE0 | i).collect();

        for len in [Aes128, Aes192, Aes256] {
            let aes = Aes::new(len);
            let key: Vec<u8> = (0..len.key_bytes() as u8).map(|i| i ^ 0x5A).collect();

            let ct = aes.encrypt_ecb(&input, &key).unwrap();
            assert_ne!(ct, input);
            assert_eq!(aes.decrypt_ecb(&ct, &key).unwrap(), input);

            let ct = aes.encrypt_cbc(&input, &key, &iv).unwrap();
            assert_eq!(aes.decrypt_cbc(&ct, &key, &iv).unwrap(), input);

            let ct = aes.encrypt_cfb(&input, &key, &iv).unwrap();
            assert_eq!(aes.decrypt_cfb(&ct, &key, &iv).unwrap(), input);
        }
    }

    #[test]
    fn test_round_trips_random() {
        use rand::Rng;

        let mut rng = rand::rng();

        for _ in 0..8 {
            let input: Vec<u8> = (0..128).map(|_| rng.random()).collect();
            let key: Vec<u8> = (0..32).map(|_| rng.random()).collect();
            let iv: Vec<u8> = (0..16).map(|_| rng.random()).collect();

            let aes = Aes::new(Aes256);
            let ct = aes.encrypt_cbc(&input, &key, &iv).unwrap();
            assert_eq!(aes.decrypt_cbc(&ct, &key, &iv).unwrap(), input);

            let ct = aes.encrypt_cfb(&input, &key, &iv).unwrap();
            assert_eq!(aes.decrypt_cfb(&ct, &key, &iv).unwrap(), input);
        }
    }

    #[test]
    fn test_ragged_length() {
        let aes = Aes::new(Aes128);
        let key = [0u8; 16];

        assert_eq!(aes.encrypt_ecb(&[0; 15], &key), Err(NxdnError::BlockLength));
        assert_eq!(aes.decrypt_ecb(&[0; 17], &key), Err(NxdnError::BlockLength));
        assert_eq!(
            aes.encrypt_cbc(&[0; 31], &key, &[0; 16]),
            Err(NxdnError::BlockLength)
        );
        assert_eq!(
            aes.decrypt_cfb(&[0; 1], &key, &[0; 16]),
            Err(NxdnError::BlockLength)
        );

        assert!(aes.encrypt_ecb(&[], &key).unwrap().is_empty());
    }

    #[test]
    fn test_cbc_chains_blocks() {
        // Identical plaintext blocks must not produce identical ciphertext
        // blocks under CBC.
        let aes = Aes::new(Aes128);
        let input = [0x42u8; 32];

        let ct = aes.encrypt_cbc(&input, &NIST_KEY, &NIST_IV).unwrap();
        assert_ne!(ct[..16], ct[16..]);

        let ecb = aes.encrypt_ecb(&input, &NIST_KEY).unwrap();
        assert_eq!(ecb[..16], ecb[16..]);
    }
}
