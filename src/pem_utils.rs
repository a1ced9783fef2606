use crate::error::{Error, Result};

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, checking the label.
pub fn pem_to_der(pem_str: &str, expected_label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| Error::InvalidInput(e.to_string()))?;
    if pem.tag() != expected_label {
        return Err(Error::InvalidInput(format!(
            "expected {expected_label} PEM block, found {}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_roundtrip() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x01];
        let pem = der_to_pem(&der, "CERTIFICATE");
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(pem_to_der(&pem, "CERTIFICATE").unwrap(), der);
    }

    #[test]
    fn label_mismatch_is_rejected() {
        let pem = der_to_pem(&[0x30, 0x00], "PRIVATE KEY");
        assert!(matches!(
            pem_to_der(&pem, "CERTIFICATE"),
            Err(Error::InvalidInput(_))
        ));
    }
}
