//! Builders for creating test submissions without repetitive
//! boilerplate.

#![allow(dead_code)]

use faxo::SubmitFax;

/// Builder for `SubmitFax` requests with sensible test defaults.
pub struct SubmitBuilder {
    owner_id: String,
    counterparty_number: String,
    counterparty_country: String,
    document_ref: Option<String>,
    file_name: Option<String>,
    pages: Option<u32>,
}

impl SubmitBuilder {
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            counterparty_number: "5551234567".to_string(),
            counterparty_country: "US".to_string(),
            document_ref: Some("file:///tmp/doc.pdf".to_string()),
            file_name: Some("doc.pdf".to_string()),
            pages: Some(1),
        }
    }

    /// Set the counterparty number.
    pub fn number(mut self, number: &str) -> Self {
        self.counterparty_number = number.to_string();
        self
    }

    /// Set the counterparty country code.
    pub fn country(mut self, code: &str) -> Self {
        self.counterparty_country = code.to_string();
        self
    }

    /// Set or clear the document reference.
    pub fn document_ref(mut self, document_ref: Option<&str>) -> Self {
        self.document_ref = document_ref.map(|d| d.to_string());
        self
    }

    /// Set the file name.
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Set the page count.
    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn build(self) -> SubmitFax {
        SubmitFax {
            owner_id: self.owner_id,
            counterparty_number: self.counterparty_number,
            counterparty_country: self.counterparty_country,
            document_ref: self.document_ref,
            file_name: self.file_name,
            pages: self.pages,
        }
    }
}
