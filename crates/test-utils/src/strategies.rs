//! Proptest strategies for kyc-ledger domain types.
//!
//! Reusable generators for property-based testing. Strategies produce
//! well-formed domain values while exploring edge cases through random
//! variation.

use chrono::NaiveDate;
use proptest::prelude::*;

use kyc_ledger_types::{Account, IdDocument, Nationality, NewClientRecord};

/// Generates a person name of 1-16 letters, optionally accented.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z\u{00e0}-\u{00ff}]{0,15}"
}

/// Generates a plausible email address.
pub fn arb_email() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{0,11}", "[a-z][a-z0-9]{0,7}")
        .prop_map(|(local, domain)| format!("{local}@{domain}.example"))
}

/// Generates a date of birth between 1930 and 2010.
pub fn arb_date_of_birth() -> impl Strategy<Value = NaiveDate> {
    (1930i32..=2010, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).expect("day 1-28 is valid for every month")
    })
}

/// Generates an account with an alphanumeric number and one of a few bank
/// names.
pub fn arb_account() -> impl Strategy<Value = Account> {
    ("[A-Z]{2}[0-9]{6}", prop::sample::select(vec!["BankX", "BankY", "CreditZ"])).prop_map(
        |(number, bank)| Account {
            account_number: number,
            bank_name: bank.to_string(),
        },
    )
}

/// Generates a nationality from a small country set with a passport
/// document.
pub fn arb_nationality() -> impl Strategy<Value = Nationality> {
    (
        prop::sample::select(vec!["France", "Germany", "Japan", "Brazil", "Kenya"]),
        "[A-Z][0-9]{7}",
    )
        .prop_map(|(country, number)| Nationality {
            country_name: country.to_string(),
            id_document: IdDocument {
                doc_type: "passport".to_string(),
                number,
                image_ref: None,
            },
        })
}

/// Generates a well-formed create request with one nationality.
pub fn arb_new_record() -> impl Strategy<Value = NewClientRecord> {
    (
        arb_name(),
        arb_name(),
        arb_date_of_birth(),
        arb_email(),
        arb_nationality(),
        proptest::collection::vec(arb_account(), 0..3),
    )
        .prop_map(|(first, last, dob, email, nationality, accounts)| {
            // Account numbers must be unique within one record.
            let mut seen = std::collections::HashSet::new();
            let accounts: Vec<Account> = accounts
                .into_iter()
                .filter(|a| seen.insert(a.account_number.clone()))
                .collect();
            NewClientRecord::builder()
                .first_name(first)
                .last_name(last)
                .date_of_birth(dob)
                .gender("unspecified")
                .email(email)
                .nationalities(vec![nationality])
                .account_list(accounts)
                .build()
        })
}
