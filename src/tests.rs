#[cfg(test)]
mod integration_tests {
    use crate::handlers::agents::{AgentResponse, CreateAgentRequest};
    use crate::handlers::clients::{ClientDetailResponse, ClientResponse, CreateClientRequest};
    use crate::handlers::payments::{CreatePaymentRequest, PaymentResponse};
    use crate::handlers::projects::{CreateProjectRequest, ProjectResponse};
    use crate::handlers::targets::{SetMonthTargetRequest, TargetResponse, UpsertTargetRequest};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Datelike, NaiveDate, Utc};
    use common::{ClientSummary, DashboardStats, FullPerformance, LeaderboardEntry};
    use rust_decimal::Decimal;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    async fn create_agent(server: &TestServer, name: &str) -> AgentResponse {
        let response = server
            .post("/api/v1/agents")
            .json(&CreateAgentRequest {
                full_name: Some(name.to_string()),
                role: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<AgentResponse> = response.json();
        body.data
    }

    async fn create_client(server: &TestServer, name: &str, agent_id: Option<i32>) -> ClientResponse {
        let response = server
            .post("/api/v1/clients")
            .json(&CreateClientRequest {
                name: name.to_string(),
                email: None,
                phone: None,
                address: None,
                company: None,
                industry: None,
                source: None,
                assigned_agent_id: agent_id,
                status: None,
                notes: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<ClientResponse> = response.json();
        body.data
    }

    async fn create_project(
        server: &TestServer,
        client_id: i32,
        agent_id: Option<i32>,
        name: &str,
        total: i64,
        start: NaiveDate,
    ) -> ProjectResponse {
        let response = server
            .post("/api/v1/projects")
            .json(&CreateProjectRequest {
                client_id,
                agent_id,
                name: name.to_string(),
                description: None,
                total_amount: Decimal::new(total, 0),
                status: None,
                start_date: start,
                end_date: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<ProjectResponse> = response.json();
        body.data
    }

    async fn record_payment(
        server: &TestServer,
        project_id: i32,
        amount: i64,
        payment_date: NaiveDate,
    ) -> PaymentResponse {
        let response = server
            .post("/api/v1/payments")
            .json(&CreatePaymentRequest {
                project_id,
                amount: Decimal::new(amount, 0),
                payment_date,
                payment_method: None,
                bank_account_id: None,
                category_id: None,
                note: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<PaymentResponse> = response.json();
        body.data
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_and_get_client() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created = create_client(&server, "Acme Corp", None).await;
        assert_eq!(created.name, "Acme Corp");
        assert_eq!(created.status, "active");
        assert!(created.id > 0);

        let response = server.get(&format!("/api/v1/clients/{}", created.id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ClientDetailResponse> = response.json();
        assert!(body.success);
        assert_eq!(body.data.client.name, "Acme Corp");
        // No projects yet, every derived figure is zero
        assert_eq!(body.data.cltv, Decimal::ZERO);
        assert_eq!(body.data.total_paid, Decimal::ZERO);
        assert_eq!(body.data.remaining_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_client_search() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        create_client(&server, "Globex", None).await;
        create_client(&server, "Initech", None).await;

        let response = server.get("/api/v1/clients?q=glob").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<ClientResponse>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].name, "Globex");

        // Empty query returns everyone
        let response = server.get("/api/v1/clients").await;
        let body: ApiResponse<Vec<ClientResponse>> = response.json();
        assert_eq!(body.data.len(), 2);
    }

    #[tokio::test]
    async fn test_update_client_and_reject_bad_status() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created = create_client(&server, "Acme", None).await;

        let response = server
            .put(&format!("/api/v1/clients/{}", created.id))
            .json(&serde_json::json!({ "status": "churned", "notes": "lost to competitor" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ClientResponse> = response.json();
        assert_eq!(body.data.status, "churned");
        assert_eq!(body.data.notes.as_deref(), Some("lost to competitor"));

        let response = server
            .put(&format!("/api/v1/clients/{}", created.id))
            .json(&serde_json::json!({ "status": "paused" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_client() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created = create_client(&server, "Ephemeral Ltd", None).await;

        let response = server.delete(&format!("/api/v1/clients/{}", created.id)).await;
        response.assert_status(StatusCode::OK);

        let response = server.get(&format!("/api/v1/clients/{}", created.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server.delete(&format!("/api/v1/clients/{}", created.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    /// Two projects of 1000 and 500; payments of 400 and 300 against the
    /// first. CLTV 1500, paid 700, remaining 800.
    #[tokio::test]
    async fn test_client_financials_end_to_end() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let client = create_client(&server, "Acme", None).await;
        let p1 = create_project(&server, client.id, None, "Website", 1000, date(2024, 2, 1)).await;
        create_project(&server, client.id, None, "Branding", 500, date(2024, 2, 10)).await;
        record_payment(&server, p1.id, 400, date(2024, 3, 1)).await;
        record_payment(&server, p1.id, 300, date(2024, 3, 15)).await;

        let response = server.get(&format!("/api/v1/clients/{}", client.id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ClientDetailResponse> = response.json();
        assert_eq!(body.data.cltv, Decimal::new(1500, 0));
        assert_eq!(body.data.total_paid, Decimal::new(700, 0));
        assert_eq!(body.data.remaining_balance, Decimal::new(800, 0));

        let response = server
            .get(&format!("/api/v1/clients/{}/summary", client.id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ClientSummary> = response.json();
        assert_eq!(body.data.total_projects, 2);
        assert_eq!(body.data.total_payments, 2);
        assert_eq!(body.data.total_outstanding, Decimal::new(800, 0));
    }

    #[tokio::test]
    async fn test_ledger_lists_projects_newest_first() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let client = create_client(&server, "Acme", None).await;
        create_project(&server, client.id, None, "First", 1000, date(2024, 1, 1)).await;
        create_project(&server, client.id, None, "Second", 2000, date(2024, 2, 1)).await;

        let response = server.get("/api/v1/ledger").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[0]["client_name"], "Acme");
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let client = create_client(&server, "Acme", None).await;
        let project = create_project(&server, client.id, None, "Website", 1000, date(2024, 2, 1)).await;

        // Zero and negative amounts are rejected
        let response = server
            .post("/api/v1/payments")
            .json(&CreatePaymentRequest {
                project_id: project.id,
                amount: Decimal::ZERO,
                payment_date: date(2024, 3, 1),
                payment_method: None,
                bank_account_id: None,
                category_id: None,
                note: None,
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // A payment against a missing project is rejected
        let response = server
            .post("/api/v1/payments")
            .json(&CreatePaymentRequest {
                project_id: 99999,
                amount: Decimal::new(100, 0),
                payment_date: date(2024, 3, 1),
                payment_method: None,
                bank_account_id: None,
                category_id: None,
                note: None,
            })
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    /// Writing the same agent-month twice must leave exactly one row
    /// holding the second amount.
    #[tokio::test]
    async fn test_monthly_target_upsert_is_keyed_by_month() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let agent = create_agent(&server, "Alice").await;

        let response = server
            .put("/api/v1/targets")
            .json(&UpsertTargetRequest {
                agent_id: agent.id,
                period_type: None,
                start_date: date(2024, 5, 20),
                end_date: None,
                target_amount: Decimal::new(10000, 0),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<TargetResponse> = response.json();
        // Normalized to the first of the month
        assert_eq!(body.data.start_date, date(2024, 5, 1));
        assert_eq!(body.data.end_date, date(2024, 5, 31));

        // A different day of the same month hits the same row
        let response = server
            .put("/api/v1/targets")
            .json(&UpsertTargetRequest {
                agent_id: agent.id,
                period_type: None,
                start_date: date(2024, 5, 3),
                end_date: None,
                target_amount: Decimal::new(12000, 0),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<TargetResponse> = response.json();
        assert_eq!(body.data.target_amount, Decimal::new(12000, 0));

        let response = server
            .get(&format!("/api/v1/agents/{}/targets", agent.id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<TargetResponse>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].target_amount, Decimal::new(12000, 0));
        assert_eq!(body.data[0].start_date, date(2024, 5, 1));
    }

    #[tokio::test]
    async fn test_set_month_target_future_scope() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let agent = create_agent(&server, "Alice").await;

        let response = server
            .put(&format!("/api/v1/agents/{}/targets/2024-10", agent.id))
            .json(&SetMonthTargetRequest {
                target_amount: Decimal::new(5000, 0),
                scope: Some("future".to_string()),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<TargetResponse>> = response.json();
        // October, November, December
        assert_eq!(body.data.len(), 3);
        assert_eq!(body.data[0].start_date, date(2024, 10, 1));
        assert_eq!(body.data[2].start_date, date(2024, 12, 1));
        assert!(body.data.iter().all(|t| t.target_amount == Decimal::new(5000, 0)));

        let response = server
            .put(&format!("/api/v1/agents/{}/targets/2024-13", agent.id))
            .json(&SetMonthTargetRequest {
                target_amount: Decimal::new(5000, 0),
                scope: None,
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_stats_on_empty_database() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/dashboard/stats").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<DashboardStats> = response.json();
        assert!(body.success);
        assert_eq!(body.data.period_revenue, Decimal::ZERO);
        assert_eq!(body.data.active_clients, 0);
        assert_eq!(body.data.collection_rate, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_dashboard_stats_with_window() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let client = create_client(&server, "Acme", None).await;
        let project = create_project(&server, client.id, None, "Website", 1000, date(2024, 2, 1)).await;
        record_payment(&server, project.id, 250, Utc::now().date_naive()).await;

        let response = server.get("/api/v1/dashboard/stats?window=this_month").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<DashboardStats> = response.json();
        assert_eq!(body.data.period_revenue, Decimal::new(250, 0));
        assert_eq!(body.data.mtd_revenue, Decimal::new(250, 0));

        let response = server.get("/api/v1/dashboard/stats?window=last_month").await;
        let body: ApiResponse<DashboardStats> = response.json();
        assert_eq!(body.data.period_revenue, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_performance_endpoint() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let today = Utc::now().date_naive();
        let month_key = format!("{}-{:02}", today.year(), today.month());

        let agent = create_agent(&server, "Alice").await;
        let client = create_client(&server, "Acme", Some(agent.id)).await;
        let project =
            create_project(&server, client.id, Some(agent.id), "Website", 1000, today).await;
        record_payment(&server, project.id, 500, today).await;

        let response = server
            .put(&format!("/api/v1/agents/{}/targets/{}", agent.id, month_key))
            .json(&SetMonthTargetRequest {
                target_amount: Decimal::new(1000, 0),
                scope: None,
            })
            .await;
        response.assert_status(StatusCode::OK);

        let response = server.get(&format!("/api/v1/performance/{}", agent.id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<FullPerformance> = response.json();
        assert_eq!(body.data.mtd.collections, Decimal::new(500, 0));
        assert_eq!(body.data.mtd.target, Decimal::new(1000, 0));
        assert_eq!(body.data.mtd.achievement, Decimal::new(50, 0));

        // Company-wide selector accepts the literal "all"
        let response = server.get("/api/v1/performance/all").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<FullPerformance> = response.json();
        assert_eq!(body.data.mtd.collections, Decimal::new(500, 0));

        let response = server.get("/api/v1/performance/not-a-number").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let today = Utc::now().date_naive();
        let month_key = format!("{}-{:02}", today.year(), today.month());

        let agent = create_agent(&server, "Alice").await;
        let client = create_client(&server, "Acme", Some(agent.id)).await;
        let project =
            create_project(&server, client.id, Some(agent.id), "Website", 1000, today).await;
        record_payment(&server, project.id, 400, today).await;
        server
            .put(&format!("/api/v1/agents/{}/targets/{}", agent.id, month_key))
            .json(&SetMonthTargetRequest {
                target_amount: Decimal::new(1000, 0),
                scope: None,
            })
            .await
            .assert_status(StatusCode::OK);

        let response = server.get("/api/v1/performance/leaderboard").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<LeaderboardEntry>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].agent_id, agent.id);
        assert_eq!(body.data[0].mtd_achievement, Decimal::new(40, 0));
        assert!(body.data[0].is_winner);
    }

    #[tokio::test]
    async fn test_breakdown_rejects_out_of_range_year() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let agent = create_agent(&server, "Alice").await;

        let response = server
            .get(&format!("/api/v1/performance/{}/breakdown?year=1800", agent.id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/performance/{}/breakdown?year=2024", agent.id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 12);
    }

    #[tokio::test]
    async fn test_income_sources_and_ledger() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/bank-accounts")
            .json(&serde_json::json!({ "name": "Operating" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let bank: ApiResponse<serde_json::Value> = response.json();
        let bank_id = bank.data["id"].as_i64().unwrap() as i32;

        let response = server
            .post("/api/v1/income-categories")
            .json(&serde_json::json!({ "name": "Retainer" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let category: ApiResponse<serde_json::Value> = response.json();
        let category_id = category.data["id"].as_i64().unwrap() as i32;

        let agent = create_agent(&server, "Alice").await;
        let client = create_client(&server, "Acme", Some(agent.id)).await;
        let project =
            create_project(&server, client.id, Some(agent.id), "Website", 1000, date(2024, 2, 1))
                .await;

        let response = server
            .post("/api/v1/payments")
            .json(&CreatePaymentRequest {
                project_id: project.id,
                amount: Decimal::new(300, 0),
                payment_date: date(2024, 3, 1),
                payment_method: Some("bank_transfer".to_string()),
                bank_account_id: Some(bank_id),
                category_id: Some(category_id),
                note: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server.get("/api/v1/income").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        let row = &body.data[0];
        assert_eq!(row["project_name"], "Website");
        assert_eq!(row["client_name"], "Acme");
        assert_eq!(row["agent_name"], "Alice");
        assert_eq!(row["bank_account_name"], "Operating");
        assert_eq!(row["category_name"], "Retainer");
    }

    #[tokio::test]
    async fn test_project_detail_totals() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let client = create_client(&server, "Acme", None).await;
        let project = create_project(&server, client.id, None, "Website", 1000, date(2024, 2, 1)).await;
        record_payment(&server, project.id, 400, date(2024, 3, 1)).await;

        let response = server.get(&format!("/api/v1/projects/{}", project.id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["payments"].as_array().unwrap().len(), 1);
        let paid: Decimal = body.data["paid_amount"].as_str().unwrap().parse().unwrap();
        let remaining: Decimal = body.data["remaining_amount"].as_str().unwrap().parse().unwrap();
        assert_eq!(paid, Decimal::new(400, 0));
        assert_eq!(remaining, Decimal::new(600, 0));
    }

    #[tokio::test]
    async fn test_outstanding_dashboard_excludes_fully_paid() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let settled = create_client(&server, "Settled", None).await;
        let settled_project =
            create_project(&server, settled.id, None, "Done", 500, date(2024, 1, 1)).await;
        record_payment(&server, settled_project.id, 500, date(2024, 2, 1)).await;

        let debtor = create_client(&server, "Debtor", None).await;
        create_project(&server, debtor.id, None, "Open", 800, date(2024, 1, 1)).await;

        let response = server.get("/api/v1/dashboard/outstanding").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["client_name"], "Debtor");
    }
}
