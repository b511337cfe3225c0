//! Shared fixtures for unit tests

use serde_json::{json, Value};

/// A key resource as the service would return it
pub fn sample_key(id: &str, name: &str, root: bool) -> Value {
    json!({
        "id": id,
        "type": "application/vnd.ibm.kms.key+json",
        "name": name,
        "extractable": !root,
        "state": 1,
        "crn": format!("crn:v1:bluemix:public:kms:us-south:a/0:0:key:{}", id),
        "createdBy": "IBMid-TEST",
        "creationDate": "2018-04-07T22:14:32Z"
    })
}

/// Wrap key resources in the collection envelope
pub fn key_collection(resources: Vec<Value>) -> Value {
    json!({
        "metadata": {
            "collectionType": "application/vnd.ibm.kms.key+json",
            "collectionTotal": resources.len()
        },
        "resources": resources
    })
}
