use bitcoin::hashes::{Hash, hash160, sha256};

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// First 16 bytes of SHA256(data)
pub fn hash128(data: &[u8]) -> [u8; 16] {
    let digest = sha256::Hash::hash(data).to_byte_array();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}
