//! Shared access signature strings.
//!
//! The HMAC-SHA256 itself is left to the application, which usually has a
//! hardware engine or a vetted crypto crate for it. This module only lays
//! out the string to sign and the password built from the signature.

use super::HubClient;
use crate::buffer::BufWriter;
use crate::error::Error;
use base64ct::{Base64, Encoding};

impl HubClient<'_> {
    /// The string to sign: the URL-encoded resource URI, `\n`, then `expiry`
    /// in seconds since the Unix epoch.
    pub fn sas_signature(&self, expiry: u64, buf: &mut [u8]) -> Result<usize, Error> {
        let mut w = BufWriter::new(buf);
        self.push_sas_resource(&mut w)?;
        w.push_byte(b'\n')?;
        w.push_u64(expiry)?;
        Ok(w.len())
    }

    /// The MQTT password for SAS authentication.
    ///
    /// `SharedAccessSignature sr={resource}&sig={signature}&se={expiry}[&skn={key_name}]`
    /// where `signature` is the base64 HMAC of [`Self::sas_signature`].
    pub fn sas_password(
        &self,
        base64_signature: &str,
        expiry: u64,
        key_name: Option<&str>,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        if base64_signature.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut w = BufWriter::new(buf);
        w.push_str("SharedAccessSignature sr=")?;
        self.push_sas_resource(&mut w)?;
        w.push_str("&sig=")?;
        w.push_url_encoded(base64_signature)?;
        w.push_str("&se=")?;
        w.push_u64(expiry)?;
        if let Some(key_name) = key_name.filter(|k| !k.is_empty()) {
            w.push_str("&skn=")?;
            w.push_str(key_name)?;
        }
        Ok(w.len())
    }
}

/// Base64-encode an HMAC digest into `buf`.
pub fn encode_signature(digest: &[u8], buf: &mut [u8]) -> Result<usize, Error> {
    Base64::encode(digest, buf)
        .map(str::len)
        .map_err(|_| Error::BufferTooSmall)
}

/// Decode a base64 device key into `buf`, ready to key an HMAC.
pub fn decode_key(key: &str, buf: &mut [u8]) -> Result<usize, Error> {
    Base64::decode(key, buf)
        .map(|decoded| decoded.len())
        .map_err(|err| match err {
            base64ct::Error::InvalidLength => Error::BufferTooSmall,
            _ => Error::InvalidArgument,
        })
}
