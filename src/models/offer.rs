// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job offer model and its storage record.

use serde::{Deserialize, Serialize};

/// A stored job offer.
///
/// `offer_url` is the deduplication key: no two stored offers share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Store-assigned opaque identifier
    pub id: String,
    pub position: String,
    pub company: String,
    pub salary: String,
    pub offer_url: String,
}

/// An offer candidate that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    pub position: String,
    pub company: String,
    pub salary: String,
    pub offer_url: String,
}

impl NewOffer {
    /// Attach the identifier assigned by the store.
    pub fn into_offer(self, id: String) -> Offer {
        Offer {
            id,
            position: self.position,
            company: self.company,
            salary: self.salary,
            offer_url: self.offer_url,
        }
    }
}

/// Offer document as persisted in the `offers` collection.
///
/// Field names are part of the storage format. The offer URL lives under
/// `url`, which is what the unique index is keyed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDocument {
    pub id: String,
    pub position: String,
    pub company: String,
    pub salary: String,
    pub url: String,
}

impl From<&Offer> for OfferDocument {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id.clone(),
            position: offer.position.clone(),
            company: offer.company.clone(),
            salary: offer.salary.clone(),
            url: offer.offer_url.clone(),
        }
    }
}

impl From<OfferDocument> for Offer {
    fn from(doc: OfferDocument) -> Self {
        Self {
            id: doc.id,
            position: doc.position,
            company: doc.company,
            salary: doc.salary,
            offer_url: doc.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Offer {
        NewOffer {
            position: "Junior Rust Developer".to_string(),
            company: "Ferris Labs".to_string(),
            salary: "7 000 - 9 000 PLN".to_string(),
            offer_url: "https://jobs.example.com/1".to_string(),
        }
        .into_offer("abc".to_string())
    }

    #[test]
    fn test_document_stores_offer_url_under_url_field() {
        let json = serde_json::to_value(OfferDocument::from(&sample())).unwrap();

        assert_eq!(json["url"], "https://jobs.example.com/1");
        assert_eq!(json["id"], "abc");
        assert!(json.get("offer_url").is_none());
    }

    #[test]
    fn test_document_maps_back_to_offer() {
        let doc: OfferDocument = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "position": "Junior Rust Developer",
            "company": "Ferris Labs",
            "salary": "7 000 - 9 000 PLN",
            "url": "https://jobs.example.com/1"
        }))
        .unwrap();

        assert_eq!(Offer::from(doc), sample());
    }
}
