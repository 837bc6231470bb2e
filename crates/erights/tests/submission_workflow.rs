//! Integration specifications for the rights issue submission workflow.
//!
//! Scenarios run through the public service facade and the HTTP router so
//! intake validation, the status lifecycle, reporting, export, and the auth
//! gate are exercised end to end without reaching into private modules.

mod common {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use erights::auth::{AuthService, InMemoryAdminDirectory, SessionStore};
    use erights::config::AppEnvironment;
    use erights::notify::{
        AttachmentFetcher, EmailError, EmailGateway, EmailMessage, NotificationDispatcher,
    };
    use erights::registry::import::ShareholderRecord;
    use erights::registry::InMemoryShareholderDirectory;
    use erights::router::ApiContext;
    use erights::submissions::{InMemorySubmissionStore, NewSubmission, SubmissionService};

    #[derive(Default, Clone)]
    pub(super) struct RecordingGateway {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
    }

    impl RecordingGateway {
        pub(super) fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl EmailGateway for RecordingGateway {
        async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
            self.sent.lock().expect("lock").push(message);
            Ok(())
        }
    }

    pub(super) struct NoStorage;

    #[async_trait]
    impl AttachmentFetcher for NoStorage {
        async fn fetch(&self, _path: &str) -> Result<Vec<u8>, EmailError> {
            Err(EmailError::Attachment("storage unavailable".to_string()))
        }
    }

    pub(super) fn register() -> Vec<ShareholderRecord> {
        vec![
            record("REG-0001", Some("C0000001"), "John Smith", 1000, 200),
            record("REG-0002", Some("C0000002"), "Amaka Ngozi Eze", 5000, 1000),
            record("REG-0003", None, "Bola Akande", 750, 150),
        ]
    }

    fn record(
        reg: &str,
        chn: Option<&str>,
        name: &str,
        holdings: i64,
        rights_issue: i64,
    ) -> ShareholderRecord {
        ShareholderRecord {
            reg_account_number: reg.to_string(),
            chn: chn.map(str::to_string),
            name: name.to_string(),
            holdings,
            rights_issue,
            holdings_after: Some(holdings + rights_issue),
        }
    }

    pub(super) fn submission(reg: &str) -> NewSubmission {
        NewSubmission {
            reg_account_number: reg.to_string(),
            chn: None,
            bvn: Some("22123456789".to_string()),
            action_type: "full_acceptance".to_string(),
            shares_accepted: Some(200),
            shares_renounced: None,
            apply_additional: true,
            additional_shares: Some(50),
            amount_due: 20000,
            additional_amount: Some(5000),
            amount_payable: None,
            payment_amount: None,
            additional_payment_cheque_number: None,
            partial_payment_cheque_number: None,
            contact_name: Some("John Smith".to_string()),
            email: "john@example.com".to_string(),
            mobile_phone: Some("0803-000-0000".to_string()),
            daytime_phone: None,
            filled_form_path: None,
            receipt_path: None,
        }
    }

    pub(super) struct Harness {
        pub(super) service: Arc<SubmissionService>,
        pub(super) gateway: RecordingGateway,
        pub(super) ctx: Arc<ApiContext>,
    }

    pub(super) fn build_harness() -> Harness {
        let store = Arc::new(InMemorySubmissionStore::new());
        let directory = InMemoryShareholderDirectory::new();
        directory.load(register());

        let gateway = RecordingGateway::default();
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(gateway.clone()),
            Arc::new(NoStorage),
            "alerts@example.com".to_string(),
        ));

        let service = Arc::new(SubmissionService::new(
            store,
            Arc::new(directory),
            dispatcher,
        ));

        let auth = Arc::new(AuthService::new(
            Arc::new(InMemoryAdminDirectory::new()),
            Arc::new(SessionStore::new(60)),
        ));

        let ctx = Arc::new(ApiContext {
            submissions: service.clone(),
            auth,
            environment: AppEnvironment::Test,
        });

        Harness {
            service,
            gateway,
            ctx,
        }
    }

    /// The notification pair is fired on a detached task; poll briefly
    /// until both sends land.
    pub(super) async fn wait_for_sends(gateway: &RecordingGateway, expected: usize) {
        for _ in 0..100 {
            if gateway.sent().len() >= expected {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} notifications, saw {}",
            gateway.sent().len()
        );
    }
}

mod lifecycle {
    use super::common::*;
    use erights::submissions::{SubmissionError, SubmissionKind, SubmissionStatus};

    #[tokio::test]
    async fn accepted_submission_is_stored_pending_with_recomputed_amount() {
        let harness = build_harness();

        let mut payload = submission("REG-0001");
        // The caller's derived amount is ignored in favor of the server's.
        payload.amount_payable = Some(999);

        let stored = harness
            .service
            .submit(SubmissionKind::Rights, payload)
            .await
            .expect("submission accepted");

        assert_eq!(stored.status, SubmissionStatus::Pending);
        assert_eq!(stored.amount_payable, 25000);
        assert_eq!(stored.holdings, 1000);
        assert_eq!(stored.rights_issue, 200);
        assert_eq!(stored.holdings_after, 1200);
        assert_eq!(stored.name, "John Smith");
        assert_eq!(stored.chn.as_deref(), Some("C0000001"));
    }

    #[tokio::test]
    async fn payable_amount_without_additional_is_amount_due() {
        let harness = build_harness();

        let mut payload = submission("REG-0001");
        payload.apply_additional = false;
        payload.additional_shares = None;

        let stored = harness
            .service
            .submit(SubmissionKind::Rights, payload)
            .await
            .expect("submission accepted");
        assert_eq!(stored.amount_payable, 20000);
    }

    #[tokio::test]
    async fn submission_fires_admin_alert_and_confirmation() {
        let harness = build_harness();
        harness
            .service
            .submit(SubmissionKind::Rights, submission("REG-0001"))
            .await
            .expect("submission accepted");

        wait_for_sends(&harness.gateway, 2).await;
        let sent = harness.gateway.sent();
        assert_eq!(sent[0].to, "alerts@example.com");
        assert_eq!(sent[1].to, "john@example.com");
        assert!(sent[0].html.contains("John Smith"));
    }

    #[tokio::test]
    async fn unknown_action_tag_is_rejected_not_coerced() {
        let harness = build_harness();
        let mut payload = submission("REG-0001");
        payload.action_type = "maybe_later".to_string();

        let err = harness
            .service
            .submit(SubmissionKind::Rights, payload)
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmissionError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn renounced_shares_require_the_renunciation_action() {
        let harness = build_harness();
        let mut payload = submission("REG-0001");
        payload.shares_renounced = Some(50);

        let err = harness
            .service
            .submit(SubmissionKind::Rights, payload)
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmissionError::RenunciationMismatch));
    }

    #[tokio::test]
    async fn unknown_shareholder_is_rejected() {
        let harness = build_harness();
        let err = harness
            .service
            .submit(SubmissionKind::Rights, submission("REG-9999"))
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmissionError::UnknownShareholder));
    }

    #[tokio::test]
    async fn chn_lookup_backs_up_the_account_number() {
        let harness = build_harness();
        let mut payload = submission("REG-TYPO");
        payload.chn = Some("C0000002".to_string());

        let stored = harness
            .service
            .submit(SubmissionKind::Rights, payload)
            .await
            .expect("resolved through CHN");
        assert_eq!(stored.reg_account_number, "REG-0002");
        assert_eq!(stored.name, "Amaka Ngozi Eze");
    }

    #[tokio::test]
    async fn status_round_trips_for_every_valid_value() {
        let harness = build_harness();
        let stored = harness
            .service
            .submit(SubmissionKind::Rights, submission("REG-0001"))
            .await
            .expect("submission accepted");

        let mut last_updated = stored.updated_at;
        for status in ["completed", "rejected", "pending"] {
            let updated = harness
                .service
                .update_status(stored.id, status)
                .await
                .expect("status accepted");
            assert_eq!(updated.status.label(), status);
            assert!(updated.updated_at > last_updated);
            assert_eq!(updated.amount_payable, stored.amount_payable);
            last_updated = updated.updated_at;
        }
    }

    #[tokio::test]
    async fn invalid_status_leaves_the_record_unchanged() {
        let harness = build_harness();
        let stored = harness
            .service
            .submit(SubmissionKind::Rights, submission("REG-0001"))
            .await
            .expect("submission accepted");

        let err = harness
            .service
            .update_status(stored.id, "archived")
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmissionError::InvalidStatus(_)));

        let unchanged = harness.service.get(stored.id).await.expect("still there");
        assert_eq!(unchanged.status, stored.status);
        assert_eq!(unchanged.updated_at, stored.updated_at);
    }

    #[tokio::test]
    async fn missing_submission_reports_not_found() {
        let harness = build_harness();
        let err = harness
            .service
            .update_status(404, "completed")
            .await
            .expect_err("no such row");
        assert!(matches!(err, SubmissionError::NotFound));
    }
}

mod reporting {
    use super::common::*;
    use erights::submissions::{
        ListRequest, PageRequest, SortField, SortOrder, SubmissionFilter, SubmissionKind,
    };

    async fn seed(harness: &Harness, count: usize) {
        for index in 0..count {
            let reg = ["REG-0001", "REG-0002", "REG-0003"][index % 3];
            harness
                .service
                .submit(SubmissionKind::Rights, submission(reg))
                .await
                .expect("seeded");
        }
    }

    fn request(filter: SubmissionFilter, page: u64, limit: u64) -> ListRequest {
        ListRequest {
            filter,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            page: PageRequest::new(Some(page), Some(limit)),
        }
    }

    #[tokio::test]
    async fn last_page_holds_the_remainder() {
        let harness = build_harness();
        seed(&harness, 7).await;

        let filter = SubmissionFilter::for_kind(SubmissionKind::Rights);
        let first = harness
            .service
            .list(request(filter.clone(), 1, 3))
            .await
            .expect("page 1");
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.pagination.total_count, 7);
        assert_eq!(first.pagination.total_pages, 3);
        assert!(first.pagination.has_next);
        assert!(!first.pagination.has_prev);

        let last = harness
            .service
            .list(request(filter, 3, 3))
            .await
            .expect("page 3");
        assert_eq!(last.items.len(), 1);
        assert!(!last.pagination.has_next);
        assert!(last.pagination.has_prev);
    }

    #[tokio::test]
    async fn search_matches_case_insensitively_across_fields() {
        let harness = build_harness();
        seed(&harness, 3).await;

        let filter = SubmissionFilter::for_kind(SubmissionKind::Rights)
            .with_search(Some("SMITH".to_string()));
        let page = harness
            .service
            .list(request(filter, 1, 10))
            .await
            .expect("search runs");
        assert_eq!(page.pagination.total_count, 1);
        assert_eq!(page.items[0].name, "John Smith");

        let by_chn = SubmissionFilter::for_kind(SubmissionKind::Rights)
            .with_search(Some("c0000002".to_string()));
        let page = harness
            .service
            .list(request(by_chn, 1, 10))
            .await
            .expect("search runs");
        assert_eq!(page.pagination.total_count, 1);
        assert_eq!(page.items[0].name, "Amaka Ngozi Eze");
    }

    #[tokio::test]
    async fn every_listed_row_satisfies_the_payable_invariant() {
        let harness = build_harness();
        seed(&harness, 6).await;

        let page = harness
            .service
            .list(request(
                SubmissionFilter::for_kind(SubmissionKind::Rights),
                1,
                50,
            ))
            .await
            .expect("listing");
        for row in &page.items {
            let expected = if row.apply_additional {
                row.amount_due + row.additional_amount.unwrap_or(0)
            } else {
                row.amount_due
            };
            assert_eq!(row.amount_payable, expected);
        }
    }

    #[tokio::test]
    async fn dashboard_counts_are_additive_across_channels() {
        let harness = build_harness();
        harness
            .service
            .submit(SubmissionKind::Rights, submission("REG-0001"))
            .await
            .expect("rights submission");
        harness
            .service
            .submit(SubmissionKind::Form, submission("REG-0001"))
            .await
            .expect("form submission");

        let totals = harness.service.dashboard().await.expect("totals");
        assert_eq!(totals.total_shareholders, 3);
        assert_eq!(totals.total_submissions, 2);
        assert_eq!(totals.rights_submissions, 1);
    }
}

mod export {
    use super::common::*;
    use erights::submissions::{
        rights_columns, write_csv, SubmissionFilter, SubmissionKind,
    };

    #[tokio::test]
    async fn csv_rows_match_the_filtered_count() {
        let harness = build_harness();
        for reg in ["REG-0001", "REG-0002", "REG-0003"] {
            harness
                .service
                .submit(SubmissionKind::Rights, submission(reg))
                .await
                .expect("seeded");
        }
        let mut renounced = submission("REG-0002");
        renounced.action_type = "renunciation_partial".to_string();
        renounced.shares_renounced = Some(400);
        renounced.apply_additional = false;
        harness
            .service
            .submit(SubmissionKind::Rights, renounced)
            .await
            .expect("seeded");

        let filter = SubmissionFilter::for_kind(SubmissionKind::Rights)
            .with_claiming(Some("renounced"));
        let rows = harness.service.export(&filter).await.expect("export");
        assert_eq!(rows.len(), 1);

        let csv = write_csv(&rights_columns(), &rows).expect("csv renders");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\"Subscription Date\""));
        assert!(lines[1].contains("\"Eze\""));
        assert!(lines[1].contains("\"Amaka Ngozi\""));
        assert!(lines[1].contains("\"400\""));
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};

    use erights::router::api_router;
    use tower::ServiceExt;

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request")
    }

    async fn login(router: &axum::Router) -> String {
        let credentials = json!({ "email": "ops@example.com", "password": "correct horse" });
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/admin-signup",
                credentials.clone(),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/admin/admin-login", credentials))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = read_json(response).await;
        payload
            .get("token")
            .and_then(|token| token.as_str())
            .expect("token issued")
            .to_string()
    }

    #[tokio::test]
    async fn admin_routes_reject_requests_without_a_token() {
        let harness = build_harness();
        let router = api_router(harness.ctx.clone());

        for uri in [
            "/api/admin/dashboard",
            "/api/admin/submissions",
            "/api/admin/rights-submissions",
            "/api/admin/export?format=csv",
        ] {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method("GET")
                        .uri(uri)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("dispatch");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri {uri}");
        }
    }

    #[tokio::test]
    async fn full_admin_flow_over_http() {
        let harness = build_harness();
        let router = api_router(harness.ctx.clone());

        // Public intake.
        let mut payload = submission("REG-0001");
        payload.amount_payable = Some(1);
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/rights-submissions",
                json!({
                    "reg_account_number": payload.reg_account_number,
                    "bvn": payload.bvn,
                    "action_type": payload.action_type,
                    "shares_accepted": payload.shares_accepted,
                    "apply_additional": payload.apply_additional,
                    "additional_shares": payload.additional_shares,
                    "amount_due": payload.amount_due,
                    "additional_amount": payload.additional_amount,
                    "amount_payable": payload.amount_payable,
                    "email": payload.email,
                    "mobile_phone": payload.mobile_phone,
                }),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = read_json(response).await;
        let id = created["data"]["id"].as_i64().expect("id");
        assert_eq!(created["data"]["amount_payable"], json!(25000));
        assert_eq!(created["data"]["status"], json!("pending"));

        let token = login(&router).await;
        let bearer = format!("Bearer {token}");

        // Guarded listing with search.
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/rights-submissions?search=smith&page=1&limit=10")
                    .header("authorization", bearer.clone())
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let listing = read_json(response).await;
        assert_eq!(listing["pagination"]["totalCount"], json!(1));
        assert_eq!(listing["data"][0]["payment_method"], json!("Cash"));

        // Status update round trip.
        let response = router
            .clone()
            .oneshot({
                let mut request = json_request(
                    "PATCH",
                    &format!("/api/admin/submissions/{id}/status"),
                    json!({ "status": "completed" }),
                );
                request
                    .headers_mut()
                    .insert("authorization", bearer.parse().expect("header"));
                request
            })
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let updated = read_json(response).await;
        assert_eq!(updated["data"]["status"], json!("completed"));
        assert_eq!(updated["data"]["amount_payable"], json!(25000));

        // Invalid status is a 400.
        let response = router
            .clone()
            .oneshot({
                let mut request = json_request(
                    "PATCH",
                    &format!("/api/admin/submissions/{id}/status"),
                    json!({ "status": "archived" }),
                );
                request
                    .headers_mut()
                    .insert("authorization", bearer.parse().expect("header"));
                request
            })
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // CSV export download.
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/export-rights?format=csv")
                    .header("authorization", bearer.clone())
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|value| value.to_str().ok())
            .expect("disposition")
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("rights_submissions.csv"));
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let csv = String::from_utf8(body.to_vec()).expect("utf-8");
        assert_eq!(csv.lines().count(), 2);

        // Dashboard totals behind the same guard.
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/dashboard")
                    .header("authorization", bearer)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        let totals = read_json(response).await;
        assert_eq!(totals["data"]["totalShareholders"], json!(3));
        assert_eq!(totals["data"]["rightsSubmissions"], json!(1));
    }

    #[tokio::test]
    async fn unknown_holder_is_a_404_and_bad_action_a_400() {
        let harness = build_harness();
        let router = api_router(harness.ctx.clone());

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/rights-submissions",
                json!({
                    "reg_account_number": "REG-9999",
                    "action_type": "full_acceptance",
                    "amount_due": 100,
                    "email": "ghost@example.com",
                }),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/rights-submissions",
                json!({
                    "reg_account_number": "REG-0001",
                    "action_type": "maybe_later",
                    "amount_due": 100,
                    "email": "john@example.com",
                }),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn shareholder_lookup_prefills_the_form() {
        let harness = build_harness();
        let router = api_router(harness.ctx.clone());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/shareholders/REG-0002")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["data"]["name"], json!("Amaka Ngozi Eze"));
        assert_eq!(payload["data"]["holdings"], json!(5000));

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/shareholders/REG-9999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
