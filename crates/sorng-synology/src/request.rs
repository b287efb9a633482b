//! Outgoing request descriptor.
//!
//! Every call goes to `webapi/entry.cgi`; what differs is the verb, the
//! query parameters and, for uploads, a multipart form. The session token
//! is attached last, right before dispatch, so a retry can swap it.

use crate::error::ApiScope;
use crate::types::SID_PARAM;
use crate::upload::UploadForm;
use reqwest::Method;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Which error table applies to the response.
    pub scope: ApiScope,
    pub query: Vec<(String, String)>,
    pub form: Option<UploadForm>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>, scope: ApiScope) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            scope,
            query: Vec::new(),
            form: None,
        }
    }

    /// POST with a multipart upload form.
    pub fn post_form(url: impl Into<String>, scope: ApiScope, form: UploadForm) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            scope,
            query: Vec::new(),
            form: Some(form),
        }
    }

    /// Append `api`, `version` and `method`.
    pub fn api(self, api: &str, version: u32, method: &str) -> Self {
        self.param("api", api)
            .param("version", version.to_string())
            .param("method", method)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach the session token, replacing any previous one.
    pub fn with_sid(mut self, sid: &str) -> Self {
        self.query.retain(|(k, _)| k != SID_PARAM);
        self.query.push((SID_PARAM.to_string(), sid.to_string()));
        self
    }

    pub fn sid(&self) -> Option<&str> {
        self.query_value(SID_PARAM)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// API name from the query, or from the form for uploads.
    pub fn api_name(&self) -> Option<&str> {
        self.query_value("api")
            .or_else(|| self.form.as_ref().and_then(|f| f.field("api")))
    }

    /// Method name from the query, or from the form for uploads.
    pub fn method_name(&self) -> Option<&str> {
        self.query_value("method")
            .or_else(|| self.form.as_ref().and_then(|f| f.field("method")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UploadRequest, INFO_API};
    use crate::upload::build_upload_form;

    const URL: &str = "https://nas/webapi/entry.cgi";

    #[test]
    fn api_triplet_is_appended_in_order() {
        let req = ApiRequest::get(URL, ApiScope::FileStation).api(INFO_API, 2, "get");
        assert_eq!(
            req.query,
            vec![
                ("api".to_string(), "SYNO.FileStation.Info".to_string()),
                ("version".to_string(), "2".to_string()),
                ("method".to_string(), "get".to_string()),
            ]
        );
        assert_eq!(req.method, Method::GET);
        assert!(req.sid().is_none());
    }

    #[test]
    fn with_sid_replaces_previous_token() {
        let req = ApiRequest::get(URL, ApiScope::FileStation)
            .with_sid("first")
            .with_sid("second");
        assert_eq!(req.sid(), Some("second"));
        assert_eq!(req.query.iter().filter(|(k, _)| k == "_sid").count(), 1);
    }

    #[test]
    fn upload_names_come_from_form() {
        let form = build_upload_form(UploadRequest::new("/x", "a.txt", "hi")).unwrap();
        let req = ApiRequest::post_form(URL, ApiScope::FileStation, form).with_sid("abc");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.api_name(), Some("SYNO.FileStation.Upload"));
        assert_eq!(req.method_name(), Some("upload"));
        // only the token travels in the query string of an upload
        assert_eq!(req.query, vec![("_sid".to_string(), "abc".to_string())]);
    }
}
