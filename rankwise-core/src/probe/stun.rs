//! Minimal STUN (RFC 5389) Binding request codec.
//!
//! Only what server-reflexive candidate discovery needs: encode a Binding
//! request and read the mapped address out of a Binding success response.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

pub const MAGIC_COOKIE: u32 = 0x2112_A442;
pub const HEADER_LEN: usize = 20;

const BINDING_REQUEST: u16 = 0x0001;
const BINDING_SUCCESS: u16 = 0x0101;
const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

pub type TransactionId = [u8; 12];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StunError {
    #[error("message too short ({0} bytes)")]
    Truncated(usize),
    #[error("unexpected message type 0x{0:04x}")]
    UnexpectedType(u16),
    #[error("bad magic cookie")]
    BadCookie,
    #[error("transaction id mismatch")]
    TransactionMismatch,
    #[error("response carries no mapped address")]
    NoMappedAddress,
}

/// Encode a Binding request with no attributes.
pub fn binding_request(transaction_id: &TransactionId) -> [u8; HEADER_LEN] {
    let mut msg = [0u8; HEADER_LEN];
    msg[0..2].copy_from_slice(&BINDING_REQUEST.to_be_bytes());
    // Message length (bytes 2..4) stays zero: no attributes.
    msg[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    msg[8..20].copy_from_slice(transaction_id);
    msg
}

/// Extract the reflexive address from a Binding success response.
///
/// XOR-MAPPED-ADDRESS is preferred; MAPPED-ADDRESS is accepted from older
/// servers.
pub fn parse_binding_response(
    buf: &[u8],
    transaction_id: &TransactionId,
) -> Result<SocketAddr, StunError> {
    if buf.len() < HEADER_LEN {
        return Err(StunError::Truncated(buf.len()));
    }
    let msg_type = u16::from_be_bytes([buf[0], buf[1]]);
    if msg_type != BINDING_SUCCESS {
        return Err(StunError::UnexpectedType(msg_type));
    }
    if u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) != MAGIC_COOKIE {
        return Err(StunError::BadCookie);
    }
    if &buf[8..20] != transaction_id {
        return Err(StunError::TransactionMismatch);
    }

    let msg_len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    let end = (HEADER_LEN + msg_len).min(buf.len());
    let mut offset = HEADER_LEN;
    let mut mapped = None;

    while offset + 4 <= end {
        let attr_type = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
        let attr_len = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]) as usize;
        let value_start = offset + 4;
        let value_end = value_start + attr_len;
        if value_end > end {
            break;
        }
        let value = &buf[value_start..value_end];

        match attr_type {
            ATTR_XOR_MAPPED_ADDRESS => {
                if let Some(addr) = decode_address(value, Some(transaction_id)) {
                    return Ok(addr);
                }
            }
            ATTR_MAPPED_ADDRESS => {
                mapped = mapped.or_else(|| decode_address(value, None));
            }
            _ => {}
        }

        // Attribute values are padded to a 4-byte boundary.
        offset = value_end + (4 - attr_len % 4) % 4;
    }

    mapped.ok_or(StunError::NoMappedAddress)
}

fn decode_address(value: &[u8], xor_with: Option<&TransactionId>) -> Option<SocketAddr> {
    if value.len() < 4 {
        return None;
    }
    let family = value[1];
    let mut port = u16::from_be_bytes([value[2], value[3]]);
    let cookie = MAGIC_COOKIE.to_be_bytes();
    if xor_with.is_some() {
        port ^= (MAGIC_COOKIE >> 16) as u16;
    }

    let ip = match family {
        FAMILY_IPV4 if value.len() >= 8 => {
            let mut octets = [value[4], value[5], value[6], value[7]];
            if xor_with.is_some() {
                for (o, c) in octets.iter_mut().zip(cookie.iter()) {
                    *o ^= c;
                }
            }
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        FAMILY_IPV6 if value.len() >= 20 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&value[4..20]);
            if let Some(txn) = xor_with {
                let key: Vec<u8> = cookie.iter().chain(txn.iter()).copied().collect();
                for (o, k) in octets.iter_mut().zip(key.iter()) {
                    *o ^= k;
                }
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };

    Some(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXN: TransactionId = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

    fn response(attrs: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (ty, value) in attrs {
            body.extend_from_slice(&ty.to_be_bytes());
            body.extend_from_slice(&(value.len() as u16).to_be_bytes());
            body.extend_from_slice(value);
            while body.len() % 4 != 0 {
                body.push(0);
            }
        }
        let mut msg = Vec::new();
        msg.extend_from_slice(&BINDING_SUCCESS.to_be_bytes());
        msg.extend_from_slice(&(body.len() as u16).to_be_bytes());
        msg.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
        msg.extend_from_slice(&TXN);
        msg.extend_from_slice(&body);
        msg
    }

    fn xor_v4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let cookie = MAGIC_COOKIE.to_be_bytes();
        let xport = port ^ (MAGIC_COOKIE >> 16) as u16;
        let mut v = vec![0, FAMILY_IPV4];
        v.extend_from_slice(&xport.to_be_bytes());
        v.extend(ip.iter().zip(cookie.iter()).map(|(a, b)| a ^ b));
        v
    }

    #[test]
    fn test_binding_request_layout() {
        let msg = binding_request(&TXN);
        assert_eq!(&msg[0..2], &[0x00, 0x01]);
        assert_eq!(&msg[2..4], &[0x00, 0x00]);
        assert_eq!(&msg[4..8], &[0x21, 0x12, 0xA4, 0x42]);
        assert_eq!(&msg[8..20], &TXN);
    }

    #[test]
    fn test_parse_xor_mapped_ipv4() {
        let msg = response(&[(ATTR_XOR_MAPPED_ADDRESS, xor_v4([203, 0, 113, 7], 54321))]);
        let addr = parse_binding_response(&msg, &TXN).unwrap();
        assert_eq!(addr, "203.0.113.7:54321".parse().unwrap());
    }

    #[test]
    fn test_parse_falls_back_to_mapped_address() {
        let mut plain = vec![0, FAMILY_IPV4];
        plain.extend_from_slice(&3478u16.to_be_bytes());
        plain.extend_from_slice(&[198, 51, 100, 20]);
        let msg = response(&[(0x8022, b"test".to_vec()), (ATTR_MAPPED_ADDRESS, plain)]);
        let addr = parse_binding_response(&msg, &TXN).unwrap();
        assert_eq!(addr, "198.51.100.20:3478".parse().unwrap());
    }

    #[test]
    fn test_parse_xor_mapped_ipv6() {
        let ip: Ipv6Addr = "2001:db8::7".parse().unwrap();
        let port = 40000u16;
        let mut key = MAGIC_COOKIE.to_be_bytes().to_vec();
        key.extend_from_slice(&TXN);
        let mut value = vec![0, FAMILY_IPV6];
        value.extend_from_slice(&(port ^ (MAGIC_COOKIE >> 16) as u16).to_be_bytes());
        value.extend(ip.octets().iter().zip(key.iter()).map(|(a, b)| a ^ b));

        let msg = response(&[(ATTR_XOR_MAPPED_ADDRESS, value)]);
        let addr = parse_binding_response(&msg, &TXN).unwrap();
        assert_eq!(addr, SocketAddr::new(IpAddr::V6(ip), port));
    }

    #[test]
    fn test_parse_rejects_bad_headers() {
        assert_eq!(
            parse_binding_response(&[0u8; 4], &TXN),
            Err(StunError::Truncated(4))
        );

        let mut msg = response(&[]);
        msg[0] = 0x01;
        msg[1] = 0x11;
        assert_eq!(
            parse_binding_response(&msg, &TXN),
            Err(StunError::UnexpectedType(0x0111))
        );

        let msg = response(&[]);
        let other: TransactionId = [9; 12];
        assert_eq!(
            parse_binding_response(&msg, &other),
            Err(StunError::TransactionMismatch)
        );
        assert_eq!(
            parse_binding_response(&msg, &TXN),
            Err(StunError::NoMappedAddress)
        );
    }
}
