//! Well-formedness checks that run after a pattern has matched

/// Validate a card-like number with the Luhn checksum.
///
/// Non-digit characters are ignored; the remaining digits must number 13 to 19.
pub fn is_valid_luhn(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

/// Validate a dashed U.S. Social Security Number (`AAA-GG-SSSS`).
///
/// Area `000`, `666` and `900`-`999`, group `00` and serial `0000` are never
/// issued and are rejected.
pub fn is_valid_ssn(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != 11 || bytes[3] != b'-' || bytes[6] != b'-' {
        return false;
    }

    let area = &candidate[0..3];
    let group = &candidate[4..6];
    let serial = &candidate[7..11];

    if ![area, group, serial]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return false;
    }

    if area == "000" || area == "666" || area.starts_with('9') {
        return false;
    }

    group != "00" && serial != "0000"
}
