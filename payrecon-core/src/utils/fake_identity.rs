//! Plausible payer identities for generated invoices.

use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Camila", "Daniel", "Eduarda", "Felipe", "Gabriela", "Henrique", "Isabela",
    "João", "Larissa", "Lucas", "Mariana", "Mateus", "Natália", "Pedro", "Rafaela", "Rodrigo",
    "Sofia", "Thiago",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Carvalho", "Costa", "Ferreira", "Gomes", "Lima", "Martins", "Oliveira",
    "Pereira", "Ribeiro", "Rocha", "Santos", "Silva", "Souza",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeIdentity {
    pub name: String,
    /// Formatted CPF, `000.000.000-00`.
    pub tax_id: String,
}

pub fn fake_identity<R: Rng + ?Sized>(rng: &mut R) -> FakeIdentity {
    let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
    FakeIdentity {
        name: format!("{first} {last}"),
        tax_id: fake_cpf(rng),
    }
}

/// A random CPF with valid check digits.
pub fn fake_cpf<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut digits = [0u8; 11];
    for digit in digits.iter_mut().take(9) {
        *digit = rng.random_range(0..10);
    }
    // All-equal bases are valid by checksum but rejected by the registry.
    if digits[..9].iter().all(|d| *d == digits[0]) {
        digits[8] = (digits[0] + 1) % 10;
    }
    digits[9] = cpf_check_digit(&digits[..9]);
    digits[10] = cpf_check_digit(&digits[..10]);
    format_cpf(&digits)
}

fn cpf_check_digit(base: &[u8]) -> u8 {
    let weight_start = base.len() as u32 + 1;
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * (weight_start - i as u32))
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        r => (11 - r) as u8,
    }
}

fn format_cpf(digits: &[u8; 11]) -> String {
    let s: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    format!("{}.{}.{}-{}", &s[0..3], &s[3..6], &s[6..9], &s[9..11])
}
