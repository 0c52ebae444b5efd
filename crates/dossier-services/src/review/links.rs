use uuid::Uuid;

/// Link sent to a customer to upload documents.
///
/// Without a document id this is the general upload page. With one it targets
/// the reupload page for that document, carrying the reviewer's remarks.
/// Query values are percent-encoded.
pub fn upload_link(
    origin: &str,
    customer_id: &str,
    document_id: Option<Uuid>,
    remarks: Option<&str>,
) -> String {
    let origin = origin.trim_end_matches('/');
    match document_id {
        None => format!(
            "{}/customer?userId={}",
            origin,
            urlencoding::encode(customer_id)
        ),
        Some(document_id) => format!(
            "{}/customer/reupload?customerId={}&documentId={}&remarks={}",
            origin,
            urlencoding::encode(customer_id),
            document_id,
            urlencoding::encode(remarks.unwrap_or_default())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_link() {
        assert_eq!(
            upload_link("http://localhost:3000", "CUST0001", None, None),
            "http://localhost:3000/customer?userId=CUST0001"
        );
    }

    #[test]
    fn test_targeted_link_encodes_remarks() {
        let doc = Uuid::nil();
        let link = upload_link(
            "https://intake.example.com/",
            "CUST0001",
            Some(doc),
            Some("blurry scan & cut"),
        );
        assert_eq!(
            link,
            format!(
                "https://intake.example.com/customer/reupload?customerId=CUST0001&documentId={}&remarks=blurry%20scan%20%26%20cut",
                doc
            )
        );
    }

    #[test]
    fn test_targeted_link_without_remarks() {
        let doc = Uuid::new_v4();
        let link = upload_link("http://localhost:3000", "CUST0002", Some(doc), None);
        assert!(link.ends_with("&remarks="));
    }
}
