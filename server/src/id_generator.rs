use rand::Rng;

use common::SessionId;

const SESSION_ID_LENGTH: usize = 12;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_session_id() -> SessionId {
    let mut rng = rand::rng();
    let id: String = (0..SESSION_ID_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    SessionId::new(id)
}
