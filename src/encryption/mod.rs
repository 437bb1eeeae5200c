use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};

use crate::{
    error::{PdfError, PdfResult, UnsupportedEncryption},
    objects::{Dictionary, Object, Reference},
    resolve::Resolve,
};

use self::rc4::rc4;

mod rc4;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

#[pdf_enum]
enum CryptFilterMethod {
    /// The application shall not decrypt data
    None = "None",

    /// RC4 with a key derived per object
    V2 = "V2",

    /// AES-128 in CBC mode, with the initialization vector as the first 16 bytes of the data
    AesV2 = "AESV2",

    /// AES-256, revisions 5 and 6
    AesV3 = "AESV3",
}

/// The Standard security handler, revisions 2 to 4
#[derive(Debug, Clone)]
pub struct SecurityHandler {
    key: Vec<u8>,
    permissions: u32,
    string_method: CryptFilterMethod,
    stream_method: CryptFilterMethod,
    encrypt_metadata: bool,
}

/// Which kind of data is being decrypted; strings and streams may use different crypt filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecryptionTarget {
    String,
    Stream,
}

struct StandardDict {
    revision: i32,
    /// Key length in bytes
    length: usize,
    owner: Vec<u8>,
    user: Vec<u8>,
    permissions: u32,
    encrypt_metadata: bool,
}

impl SecurityHandler {
    /// Validates `password` as either the user or the owner password. With no password, the
    /// empty user password is tried
    pub fn new(
        dict: &Dictionary,
        file_id: &[u8],
        password: Option<&[u8]>,
        resolver: &dyn Resolve,
    ) -> PdfResult<Self> {
        let filter = dict.expect_name("Filter", resolver)?;

        if filter != "Standard" {
            return Err(unsupported(format!("security handler /{}", filter)));
        }

        let v = dict.get_integer("V", resolver)?.unwrap_or(0);

        let (string_method, stream_method, length) = match v {
            1 => (CryptFilterMethod::V2, CryptFilterMethod::V2, 40),
            2 | 3 => {
                let length = dict.get_integer("Length", resolver)?.unwrap_or(40);
                (CryptFilterMethod::V2, CryptFilterMethod::V2, length)
            }
            4 => {
                let string_method = crypt_filter_method(dict, "StrF", resolver)?;
                let stream_method = crypt_filter_method(dict, "StmF", resolver)?;
                let length = dict.get_integer("Length", resolver)?.unwrap_or(128);
                (string_method, stream_method, length)
            }
            _ => return Err(unsupported(format!("encryption algorithm /V {}", v))),
        };

        if string_method == CryptFilterMethod::AesV3 || stream_method == CryptFilterMethod::AesV3 {
            return Err(unsupported("AES-256 crypt filters".to_owned()));
        }

        let revision = dict.expect_integer("R", resolver)?;

        if !(2..=4).contains(&revision) {
            return Err(unsupported(format!("standard handler revision {}", revision)));
        }

        if length % 8 != 0 || !(40..=128).contains(&length) {
            return Err(PdfError::malformed(format!("bad key length {}", length)));
        }

        let standard = StandardDict {
            revision,
            length: if revision == 2 { 5 } else { length as usize / 8 },
            owner: dict.expect_string("O", resolver)?.0,
            user: dict.expect_string("U", resolver)?.0,
            permissions: permissions(dict.get("P"))?,
            encrypt_metadata: dict.get_bool("EncryptMetadata", resolver)?.unwrap_or(true),
        };

        let key = standard
            .authenticate(password.unwrap_or(b""), file_id)
            .ok_or(if password.is_some() {
                PdfError::AuthenticationFailed
            } else {
                PdfError::AuthenticationRequired
            })?;

        Ok(Self {
            key,
            permissions: standard.permissions,
            string_method,
            stream_method,
            encrypt_metadata: standard.encrypt_metadata,
        })
    }

    /// Bit 3 of `/P`, counting from 1
    pub fn is_printable(&self) -> bool {
        self.permissions & 4 != 0
    }

    /// Bit 5 of `/P`, counting from 1
    pub fn is_saveable(&self) -> bool {
        self.permissions & 16 != 0
    }

    pub fn encrypts_metadata(&self) -> bool {
        self.encrypt_metadata
    }

    pub(crate) fn decrypt(
        &self,
        reference: Reference,
        data: &[u8],
        target: DecryptionTarget,
    ) -> PdfResult<Vec<u8>> {
        let method = match target {
            DecryptionTarget::String => self.string_method,
            DecryptionTarget::Stream => self.stream_method,
        };

        match method {
            CryptFilterMethod::None => Ok(data.to_vec()),
            CryptFilterMethod::V2 => Ok(rc4(&self.object_key(reference, false), data)),
            CryptFilterMethod::AesV2 => decrypt_aes(&self.object_key(reference, true), data),
            CryptFilterMethod::AesV3 => Err(unsupported("AES-256 crypt filters".to_owned())),
        }
    }

    /// Algorithm 1: the file key extended with the low bytes of the object and generation
    /// numbers, hashed
    fn object_key(&self, reference: Reference, aes: bool) -> Vec<u8> {
        let mut key = self.key.clone();

        key.extend_from_slice(&(reference.object_number as u32).to_le_bytes()[..3]);
        key.extend_from_slice(&(reference.generation as u32).to_le_bytes()[..2]);

        if aes {
            key.extend_from_slice(b"sAlT");
        }

        let n = (self.key.len() + 5).min(16);

        md5::compute(&key)[..n].to_vec()
    }
}

impl StandardDict {
    /// Returns the file key if `password` is the user or the owner password
    fn authenticate(&self, password: &[u8], file_id: &[u8]) -> Option<Vec<u8>> {
        let key = self.file_key(password, file_id);

        if self.is_user_key(&key, file_id) {
            return Some(key);
        }

        let user_password = self.user_password_from_owner(password);
        let key = self.file_key(&user_password, file_id);

        if self.is_user_key(&key, file_id) {
            return Some(key);
        }

        None
    }

    /// Algorithm 2
    fn file_key(&self, password: &[u8], file_id: &[u8]) -> Vec<u8> {
        let mut hash = md5::Context::new();

        hash.consume(pad_password(password));
        hash.consume(&self.owner);
        hash.consume(self.permissions.to_le_bytes());
        hash.consume(file_id);

        if self.revision >= 4 && !self.encrypt_metadata {
            hash.consume([0xFF, 0xFF, 0xFF, 0xFF]);
        }

        let mut digest = hash.compute();

        if self.revision >= 3 {
            for _ in 0..50 {
                digest = md5::compute(&digest[..self.length]);
            }
        }

        digest[..self.length].to_vec()
    }

    /// Algorithms 4 and 5 produce `/U`, which is compared against the stored value. For
    /// revision 3 and later only the first 16 bytes are significant
    fn compute_user_entry(&self, key: &[u8], file_id: &[u8]) -> Vec<u8> {
        if self.revision == 2 {
            return rc4(key, &PADDING);
        }

        let mut hash = md5::Context::new();
        hash.consume(PADDING);
        hash.consume(file_id);

        let mut value = rc4(key, &hash.compute().0);

        for i in 1..=19_u8 {
            let round_key = key.iter().map(|b| b ^ i).collect::<Vec<u8>>();
            value = rc4(&round_key, &value);
        }

        value
    }

    fn is_user_key(&self, key: &[u8], file_id: &[u8]) -> bool {
        let expected = self.compute_user_entry(key, file_id);

        if self.revision == 2 {
            self.user.get(..32) == Some(&expected[..])
        } else {
            self.user.get(..16) == expected.get(..16)
        }
    }

    /// Algorithm 7: the padded user password is `/O` decrypted with a key derived from the owner
    /// password
    fn user_password_from_owner(&self, owner_password: &[u8]) -> Vec<u8> {
        let key = self.owner_key(owner_password);

        if self.revision == 2 {
            return rc4(&key, &self.owner);
        }

        let mut value = self.owner.clone();

        for i in (0..=19_u8).rev() {
            let round_key = key.iter().map(|b| b ^ i).collect::<Vec<u8>>();
            value = rc4(&round_key, &value);
        }

        value
    }

    /// Algorithm 3, steps a to d
    fn owner_key(&self, owner_password: &[u8]) -> Vec<u8> {
        let mut digest = md5::compute(pad_password(owner_password));

        if self.revision >= 3 {
            for _ in 0..50 {
                digest = md5::compute(digest.0);
            }
        }

        digest[..self.length].to_vec()
    }
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PADDING;
    let len = password.len().min(32);

    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);

    padded
}

/// `/P` is a signed 32-bit value, which some producers write unsigned
fn permissions(obj: Option<&Object>) -> PdfResult<u32> {
    match obj {
        Some(Object::Integer(p)) => Ok(*p as u32),
        Some(Object::Real(p)) => Ok(*p as i64 as u32),
        Some(found) => Err(PdfError::MismatchedObjectType {
            expected: crate::objects::ObjectType::Integer,
            found: found.object_type(),
        }),
        None => Err(PdfError::MissingRequiredKey { key: "P" }),
    }
}

/// The method of the crypt filter named by `key`. `/Identity` and absent entries decrypt nothing
fn crypt_filter_method(
    dict: &Dictionary,
    key: &str,
    resolver: &dyn Resolve,
) -> PdfResult<CryptFilterMethod> {
    let name = match dict.get_name(key, resolver)? {
        Some(name) => name,
        None => return Ok(CryptFilterMethod::None),
    };

    if name == "Identity" {
        return Ok(CryptFilterMethod::None);
    }

    let filter = dict
        .get_dict("CF", resolver)?
        .map(|cf| cf.get_dict(&name, resolver))
        .transpose()?
        .flatten()
        .ok_or_else(|| PdfError::malformed(format!("crypt filter /{} is not defined", name)))?;

    match filter.get_name("CFM", resolver)? {
        Some(method) => CryptFilterMethod::from_str(&method)
            .map_err(|_| unsupported(format!("crypt filter method /{}", method))),
        None => Ok(CryptFilterMethod::None),
    }
}

fn decrypt_aes(key: &[u8], data: &[u8]) -> PdfResult<Vec<u8>> {
    if data.len() < 16 {
        return Err(PdfError::malformed("AES data shorter than its initialization vector"));
    }

    let (iv, ciphertext) = data.split_at(16);

    // trailing bytes that do not fill a block are dropped
    let mut buffer = ciphertext[..ciphertext.len() - ciphertext.len() % 16].to_vec();

    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| PdfError::malformed("bad AES key length"))?;

    let len = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| PdfError::malformed("bad AES padding"))?
        .len();

    buffer.truncate(len);

    Ok(buffer)
}

fn unsupported(what: String) -> PdfError {
    PdfError::UnsupportedEncryption(UnsupportedEncryption::NotSupportedByBuild(what))
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::{objects::PdfString, resolve::NoResolve};

    pub(crate) const FILE_ID: &[u8] = b"0123456789abcdef";

    /// Builds `/O` and `/U` for the given passwords, encrypting exactly as a writer would
    pub(crate) fn standard_dict(revision: i32, user: &[u8], owner: &[u8], p: i32) -> Dictionary {
        let length = if revision == 2 { 5 } else { 16 };

        let mut standard = StandardDict {
            revision,
            length,
            owner: Vec::new(),
            user: Vec::new(),
            permissions: p as u32,
            encrypt_metadata: true,
        };

        let owner_key = standard.owner_key(owner);
        standard.owner = if revision == 2 {
            rc4(&owner_key, &pad_password(user))
        } else {
            let mut value = pad_password(user).to_vec();
            for i in 0..=19_u8 {
                let round_key = owner_key.iter().map(|b| b ^ i).collect::<Vec<u8>>();
                value = rc4(&round_key, &value);
            }
            value
        };

        let key = standard.file_key(user, FILE_ID);
        let mut u = standard.compute_user_entry(&key, FILE_ID);
        u.resize(32, 0);

        let mut dict = Dictionary::default();
        dict.insert("Filter", Object::Name("Standard".to_owned()));
        dict.insert("V", Object::Integer(if revision == 2 { 1 } else { 2 }));
        dict.insert("R", Object::Integer(revision));
        dict.insert("Length", Object::Integer(length as i32 * 8));
        dict.insert("O", Object::String(PdfString(standard.owner)));
        dict.insert("U", Object::String(PdfString(u)));
        dict.insert("P", Object::Integer(p));
        dict
    }

    /// RC4 is symmetric, so this is also how a writer encrypts
    pub(crate) fn encrypt_rc4(handler: &SecurityHandler, reference: Reference, data: &[u8]) -> Vec<u8> {
        rc4(&handler.object_key(reference, false), data)
    }

    #[test]
    fn empty_user_password_opens_without_prompt() {
        for revision in [2, 3] {
            let dict = standard_dict(revision, b"", b"owner", -4);
            assert!(SecurityHandler::new(&dict, FILE_ID, None, &NoResolve).is_ok());
        }
    }

    #[test]
    fn user_and_owner_passwords() {
        let dict = standard_dict(3, b"user", b"owner", -4);

        assert!(SecurityHandler::new(&dict, FILE_ID, Some(b"user"), &NoResolve).is_ok());
        assert!(SecurityHandler::new(&dict, FILE_ID, Some(b"owner"), &NoResolve).is_ok());
        assert!(matches!(
            SecurityHandler::new(&dict, FILE_ID, Some(b"wrong"), &NoResolve),
            Err(PdfError::AuthenticationFailed)
        ));
        assert!(matches!(
            SecurityHandler::new(&dict, FILE_ID, None, &NoResolve),
            Err(PdfError::AuthenticationRequired)
        ));
    }

    #[test]
    fn permission_bits() {
        // print allowed, save denied
        let dict = standard_dict(2, b"", b"", !16);
        let handler = SecurityHandler::new(&dict, FILE_ID, None, &NoResolve).unwrap();
        assert!(handler.is_printable());
        assert!(!handler.is_saveable());

        let dict = standard_dict(2, b"", b"", !4);
        let handler = SecurityHandler::new(&dict, FILE_ID, None, &NoResolve).unwrap();
        assert!(!handler.is_printable());
        assert!(handler.is_saveable());
    }

    #[test]
    fn rc4_strings_round_trip() {
        let dict = standard_dict(3, b"", b"", -4);
        let handler = SecurityHandler::new(&dict, FILE_ID, None, &NoResolve).unwrap();
        let reference = Reference::new(7, 0);

        let ciphertext = rc4(&handler.object_key(reference, false), b"secret text");

        assert_eq!(
            handler
                .decrypt(reference, &ciphertext, DecryptionTarget::String)
                .unwrap(),
            b"secret text"
        );
    }

    #[test]
    fn unsupported_handlers() {
        let mut dict = standard_dict(3, b"", b"", -4);
        dict.insert("Filter", Object::Name("Adobe.PubSec".to_owned()));

        assert!(matches!(
            SecurityHandler::new(&dict, FILE_ID, None, &NoResolve),
            Err(PdfError::UnsupportedEncryption(
                UnsupportedEncryption::NotSupportedByBuild(..)
            ))
        ));

        let mut dict = standard_dict(3, b"", b"", -4);
        dict.insert("V", Object::Integer(5));
        dict.insert("R", Object::Integer(6));

        assert!(matches!(
            SecurityHandler::new(&dict, FILE_ID, None, &NoResolve),
            Err(PdfError::UnsupportedEncryption(..))
        ));
    }
}
