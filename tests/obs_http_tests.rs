use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
};
use obs_object_store::{
    ObjectClient, ObjectKey, ObsStorage, ObsStorageConfig, StorageError,
    adapters::outbound::storage::obs::{
        ListObjectsOutput, ObsContent, signing::payload_hash, xml::list_objects_to_xml,
    },
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

const BUCKET: &str = "thanos-obs-test";

/// A request as seen by the fake OBS endpoint
#[derive(Clone, Debug)]
struct Recorded {
    method: Method,
    path: String,
    query: String,
    headers: HeaderMap,
    body: Bytes,
}

type Responder = Arc<dyn Fn(&Recorded, usize) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct FakeState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    responder: Responder,
}

struct FakeObs {
    endpoint: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeObs {
    /// Serve every request with `responder`, which also gets the
    /// zero-based index of the request
    async fn start(
        responder: impl Fn(&Recorded, usize) -> (StatusCode, String) + Send + Sync + 'static,
    ) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            requests: requests.clone(),
            responder: Arc::new(responder),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}", addr),
            requests,
        }
    }

    fn storage(&self) -> ObsStorage {
        let config = ObsStorageConfig::new(&self.endpoint, BUCKET, "accesskey", "secretkey");
        ObsStorage::new(&config).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let request = Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        headers,
        body,
    };

    let index = {
        let mut requests = state.requests.lock().unwrap();
        requests.push(request.clone());
        requests.len() - 1
    };

    (state.responder)(&request, index)
}

fn no_such_key() -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><RequestId>0001</RequestId></Error>"#
            .to_string(),
    )
}

fn listing(
    keys: &[&str],
    prefixes: &[&str],
    next_marker: Option<&str>,
    truncated: bool,
) -> (StatusCode, String) {
    let output = ListObjectsOutput {
        name: BUCKET.to_string(),
        prefix: "thanos/".to_string(),
        is_truncated: truncated,
        next_marker: next_marker.map(str::to_string),
        contents: keys
            .iter()
            .map(|k| ObsContent {
                key: k.to_string(),
                size: 10,
                ..Default::default()
            })
            .collect(),
        common_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
    };
    (StatusCode::OK, list_objects_to_xml(&output, "/").unwrap())
}

fn key(name: &str) -> ObjectKey {
    ObjectKey::new(name.to_string()).unwrap()
}

#[tokio::test]
async fn test_delete_existing_object() {
    let fake = FakeObs::start(|_, _| (StatusCode::NO_CONTENT, String::new())).await;

    fake.storage().delete_object(&key("thanos/file1")).await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(requests[0].path, "/thanos-obs-test/thanos/file1");
}

#[tokio::test]
async fn test_delete_missing_object() {
    let fake = FakeObs::start(|_, _| no_such_key()).await;

    let err = fake
        .storage()
        .delete_object(&key("thanos/missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, StorageError::ObjectNotFound { .. }));
}

#[tokio::test]
async fn test_put_object_sends_signed_body() {
    let fake = FakeObs::start(|_, _| (StatusCode::OK, String::new())).await;

    fake.storage()
        .put_object(
            &key("thanos/file1"),
            Box::new(Cursor::new(b"putObject".to_vec())),
        )
        .await
        .unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.path, "/thanos-obs-test/thanos/file1");
    assert_eq!(&request.body[..], b"putObject");
    assert_eq!(
        request.headers["x-amz-content-sha256"].to_str().unwrap(),
        payload_hash(b"putObject")
    );

    let authorization = request.headers["authorization"].to_str().unwrap();
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=accesskey/"));
    assert!(authorization.contains("/us-east-1/s3/aws4_request"));
    assert!(request.headers.contains_key("x-amz-date"));
}

#[tokio::test]
async fn test_put_object_failure() {
    let fake = FakeObs::start(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, String::new())).await;

    let err = fake
        .storage()
        .put_object(&key("thanos/file1"), Box::new(Cursor::new(Vec::new())))
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_get_existing_object() {
    let fake = FakeObs::start(|_, _| (StatusCode::OK, "getObject".to_string())).await;

    let mut reader = fake.storage().get_object(&key("thanos/file1")).await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).await.unwrap();

    assert_eq!(body, "getObject");
    assert_eq!(fake.requests()[0].method, Method::GET);
}

#[tokio::test]
async fn test_get_missing_object() {
    let fake = FakeObs::start(|_, _| no_such_key()).await;

    let err = fake
        .storage()
        .get_object(&key("thanos/missing"))
        .await
        .err()
        .unwrap();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_forbidden_object() {
    let fake = FakeObs::start(|_, _| (StatusCode::FORBIDDEN, String::new())).await;

    let err = fake
        .storage()
        .get_object(&key("thanos/secret"))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StorageError::AccessDenied { .. }));
}

#[tokio::test]
async fn test_list_single_page() {
    let fake = FakeObs::start(|_, _| {
        listing(
            &["thanos/file1", "thanos/file2"],
            &["thanos/folder1/", "thanos/folder2/"],
            None,
            false,
        )
    })
    .await;

    let result = fake.storage().list("thanos/", "/").await.unwrap();

    assert_eq!(
        result.keys().collect::<Vec<_>>(),
        vec!["thanos/file1", "thanos/file2"]
    );
    assert_eq!(result.common_prefixes.len(), 2);
    assert_eq!(result.objects[0].size, 10);

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/thanos-obs-test");
    assert!(requests[0].query.contains("prefix=thanos%2F"));
    assert!(requests[0].query.contains("delimiter=%2F"));
    assert!(!requests[0].query.contains("marker="));
}

#[tokio::test]
async fn test_list_follows_next_marker() {
    let fake = FakeObs::start(|_, index| match index {
        0 => listing(
            &["thanos/file1", "thanos/file2", "thanos/file3"],
            &["thanos/folder1/", "thanos/folder2/", "thanos/folder3/"],
            Some("nextMarker"),
            true,
        ),
        _ => listing(
            &["thanos/file4", "thanos/file5"],
            &["thanos/folder4/", "thanos/folder5/", "thanos/folder6/"],
            None,
            false,
        ),
    })
    .await;

    let result = fake.storage().list("thanos/", "/").await.unwrap();

    assert_eq!(result.objects.len(), 5);
    assert_eq!(result.common_prefixes.len(), 6);
    assert_eq!(result.objects[3].key, "thanos/file4");

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].query.contains("marker=nextMarker"));
}

#[tokio::test]
async fn test_list_fails_on_service_error() {
    let fake = FakeObs::start(|_, index| match index {
        0 => listing(&["thanos/file1"], &[], Some("thanos/file1"), true),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    })
    .await;

    let err = fake.storage().list("thanos/", "/").await.unwrap_err();

    assert!(matches!(err, StorageError::InfrastructureError { .. }));
    assert_eq!(err.status(), Some(500));
    assert_eq!(fake.requests().len(), 2);
}

#[tokio::test]
async fn test_list_rejects_unparseable_page() {
    let fake = FakeObs::start(|_, _| (StatusCode::OK, "<ListBucketResult><Contents>".to_string())).await;

    let err = fake.storage().list("thanos/", "/").await.unwrap_err();

    assert!(matches!(err, StorageError::InfrastructureError { .. }));
}
