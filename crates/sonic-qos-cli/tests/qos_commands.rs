//! End-to-end command tests against in-memory databases.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pretty_assertions::assert_eq;
use sonic_config_sync::{SyncConfig, SyncConfigurator};
use sonic_config_test::{
    port_fixtures, qos_fixtures, seed_all, tables, AgentResponse, EntryVerifier, SimulatedAgent,
};
use sonic_db_common::{field_map, MemoryConfigDb, MemoryStateDb};
use sonic_qos_cli::{execute, Cli, CliError, PlatformInfo, QosConfig, EXIT_USAGE};

struct Switch {
    config_db: Arc<MemoryConfigDb>,
    state_db: Arc<MemoryStateDb>,
    qos: QosConfig,
}

impl Switch {
    fn new(platform: PlatformInfo) -> Self {
        let config_db = Arc::new(MemoryConfigDb::new());
        let state_db = Arc::new(MemoryStateDb::new());
        let sync = SyncConfigurator::new(config_db.clone(), state_db.clone())
            .with_config(SyncConfig::default().with_timeout(Duration::from_secs(10)));
        let qos = QosConfig::new(config_db.clone(), sync, platform);
        seed_all(&config_db, &port_fixtures::ethernet_ports(4));
        Self {
            config_db,
            state_db,
            qos,
        }
    }

    fn with_queue_agent(self, response: AgentResponse) -> (Self, Arc<SimulatedAgent>) {
        let agent = SimulatedAgent::new(
            self.state_db.clone(),
            tables::TC_TO_QUEUE_MAP,
            tables::QOS_TC_TO_QUEUE_MAP_TABLE,
        )
        .respond(response)
        .attach(&self.config_db);
        (self, agent)
    }

    async fn run(&self, args: &str) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("qoscfg").chain(args.split_whitespace()))
            .expect("valid command line");
        execute(cli.command, &self.qos).await
    }

    fn verifier(&self) -> EntryVerifier<'_> {
        EntryVerifier::new(self.config_db.as_ref())
    }
}

#[tokio::test(start_paused = true)]
async fn test_tc_queue_add_confirmed() {
    let (switch, agent) = Switch::new(PlatformInfo::default())
        .with_queue_agent(AgentResponse::success().delayed(Duration::from_secs(2)));

    let out = switch
        .run("config qos tc-queue add AZURE --tc 0-3 --queue 1")
        .await
        .unwrap();

    assert_eq!(out, "");
    assert_eq!(agent.processed(), 1);
    switch
        .verifier()
        .assert_entry_eq(
            "TC_TO_QUEUE_MAP",
            "AZURE",
            &field_map! { "0" => "1", "1" => "1", "2" => "1", "3" => "1" },
        )
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tc_queue_add_rejected_is_rolled_back() {
    let (switch, _agent) = Switch::new(PlatformInfo::default())
        .with_queue_agent(AgentResponse::failure("Queue 1 is not available"));

    let err = switch
        .run("config qos tc-queue add AZURE --tc 0 --queue 1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Queue 1 is not available");
    assert_eq!(err.exit_code(), EXIT_USAGE);
    switch
        .verifier()
        .assert_absent("TC_TO_QUEUE_MAP", "AZURE")
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tc_queue_add_timeout() {
    let (switch, _agent) =
        Switch::new(PlatformInfo::default()).with_queue_agent(AgentResponse::silent());

    let err = switch
        .run("config qos tc-queue add AZURE --tc 0 --queue 1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Timeout");
    assert!(switch.config_db.snapshot("TC_TO_QUEUE_MAP", "AZURE").is_empty());
    assert_eq!(switch.state_db.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tc_queue_update_rejected_restores_profile() {
    let (switch, _agent) =
        Switch::new(PlatformInfo::default()).with_queue_agent(AgentResponse::failure("rejected"));
    let original = qos_fixtures::tc_to_queue_identity("AZURE");
    original.seed(&switch.config_db);

    let err = switch
        .run("config qos tc-queue update AZURE --tc 5-7 --queue 0")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "rejected");
    switch
        .verifier()
        .assert_entry_eq("TC_TO_QUEUE_MAP", "AZURE", &original.fields)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tc_queue_update_remove() {
    let (switch, _agent) =
        Switch::new(PlatformInfo::default()).with_queue_agent(AgentResponse::success());
    qos_fixtures::tc_to_queue_identity("AZURE").seed(&switch.config_db);

    switch
        .run("config qos tc-queue update AZURE --tc 1-7 --remove")
        .await
        .unwrap();
    switch
        .verifier()
        .assert_entry_eq("TC_TO_QUEUE_MAP", "AZURE", &field_map! { "0" => "0" })
        .await
        .unwrap();

    // Removing the last key deletes the profile without waiting.
    switch
        .run("config qos tc-queue update AZURE --tc 0 --remove")
        .await
        .unwrap();
    switch
        .verifier()
        .assert_absent("TC_TO_QUEUE_MAP", "AZURE")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tc_queue_delete_does_not_wait() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::tc_to_queue_identity("AZURE").seed(&switch.config_db);

    switch.run("config qos tc-queue del AZURE").await.unwrap();

    assert!(switch.config_db.snapshot("TC_TO_QUEUE_MAP", "AZURE").is_empty());
    assert_eq!(switch.state_db.subscriptions_opened(), 0);
}

#[tokio::test]
async fn test_direct_kinds_do_not_subscribe() {
    let switch = Switch::new(PlatformInfo::default());

    switch
        .run("config qos dscp-tc add AZURE --dscp 46 --tc 5")
        .await
        .unwrap();
    switch
        .run("config qos dscp-tc update AZURE --dscp 0-7 --tc 0")
        .await
        .unwrap();
    switch
        .run("config qos tc-pg add AZURE --tc 3-4 --pg 3")
        .await
        .unwrap();

    assert_eq!(switch.state_db.subscriptions_opened(), 0);
    switch
        .verifier()
        .assert_field_value("DSCP_TO_TC_MAP", "AZURE", "46", "5")
        .await
        .unwrap();
    switch
        .verifier()
        .assert_field_value("DSCP_TO_TC_MAP", "AZURE", "7", "0")
        .await
        .unwrap();
    switch
        .verifier()
        .assert_field_value("TC_TO_PRIORITY_GROUP_MAP", "AZURE", "4", "3")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validation_errors() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::dot1p_to_tc_flat("AZURE").seed(&switch.config_db);

    let cases = [
        (
            "config qos dot1p-tc add AZURE --dot1p 0 --tc 1",
            "Profile 'AZURE' already exists use update command.",
        ),
        (
            "config qos dot1p-tc add NEW --dot1p 0-8 --tc 1",
            "Invalid dot1p value 0-8, value should be in range of 0-7.",
        ),
        (
            "config qos dscp-tc add NEW --dscp 1,2,1 --tc 1",
            "dscp value 1 is repeated.",
        ),
        (
            "config qos tc-pg add NEW --tc 3,2-4 --pg 1",
            "tc value 3 is repeated",
        ),
        (
            "config qos dot1p-tc update MISSING --dot1p 0 --tc 1",
            "Profile 'MISSING' not found.",
        ),
        (
            "config qos dot1p-tc update AZURE --dot1p 0",
            "--tc is a required parameter.",
        ),
        (
            "config qos tc-queue del MISSING",
            "tc-queue profile 'MISSING' not found.",
        ),
    ];

    for (args, expected) in cases {
        let err = switch.run(args).await.unwrap_err();
        assert_eq!(err.to_string(), expected, "for `{}`", args);
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
    assert_eq!(switch.config_db.write_count(), 0);
}

#[tokio::test]
async fn test_bound_profile_cannot_change() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::tc_to_pg_lossless("AZURE").seed(&switch.config_db);

    switch
        .run("config interface qos tc-pg bind Ethernet4 AZURE")
        .await
        .unwrap();

    for args in [
        "config qos tc-pg del AZURE",
        "config qos tc-pg update AZURE --tc 0 --pg 1",
    ] {
        let err = switch.run(args).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The profile is binding to interface, unbind from it first."
        );
    }

    switch
        .run("config interface qos tc-pg unbind Ethernet4")
        .await
        .unwrap();
    switch.run("config qos tc-pg del AZURE").await.unwrap();
    switch
        .verifier()
        .assert_absent("PORT_QOS_MAP", "Ethernet4")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bind_all_ports() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::tc_to_queue_identity("AZURE").seed(&switch.config_db);

    switch
        .run("config interface qos tc-queue bind all AZURE")
        .await
        .unwrap();

    for port in ["Ethernet0", "Ethernet4", "Ethernet8", "Ethernet12"] {
        switch
            .verifier()
            .assert_field_value("PORT_QOS_MAP", port, "tc_to_queue_map", "AZURE")
            .await
            .unwrap();
    }

    let out = switch.run("show interfaces qos").await.unwrap();
    assert!(out.starts_with("Ethernet0:\n  TC to Queue: AZURE\n\nEthernet4:"));
    assert!(out.ends_with("Ethernet12:\n  TC to Queue: AZURE\n\n"));
}

#[tokio::test]
async fn test_bind_errors() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::dot1p_to_tc_flat("AZURE").seed(&switch.config_db);

    let cases = [
        (
            "config interface qos dot1p-tc bind Ethernet0",
            "Cannot find dot1p-tc profile.",
        ),
        (
            "config interface qos dot1p-tc bind Ethernet99 AZURE",
            "Interface 'Ethernet99' not found.",
        ),
        (
            "config interface qos dot1p-tc bind all AZURE",
            "Interface 'all' not found.",
        ),
        (
            "config interface qos dot1p-tc bind Ethernet0 MISSING",
            "dot1p-tc profile 'MISSING' not found.",
        ),
    ];

    for (args, expected) in cases {
        let err = switch.run(args).await.unwrap_err();
        assert_eq!(err.to_string(), expected, "for `{}`", args);
    }
}

#[tokio::test]
async fn test_barefoot_restrictions() {
    let switch = Switch::new(PlatformInfo::with_asic_type("barefoot"));
    qos_fixtures::tc_to_queue_identity("AZURE").seed(&switch.config_db);

    let err = switch
        .run("config qos tc-queue add SECOND --tc 0 --queue 0")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only one profile is supported on Intel platform."
    );

    let err = switch
        .run("config interface qos tc-queue bind Ethernet0 AZURE")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Not support to bind tc-queue profile on Intel platform."
    );

    // Other kinds are unaffected.
    qos_fixtures::tc_to_pg_lossless("AZURE").seed(&switch.config_db);
    switch
        .run("config interface qos tc-pg bind Ethernet0 AZURE")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_show_qos() {
    let switch = Switch::new(PlatformInfo::default());
    qos_fixtures::dscp_to_tc_class_selector("AZURE").seed(&switch.config_db);

    let out = switch.run("show qos dscp-tc AZURE").await.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "dscp-tc policy: AZURE");
    assert_eq!(lines[3], "0 1 2 3 4 5 6 7             0");
    assert_eq!(lines[10], "56 57 58 59 60 61 62 63     7");

    let out = switch.run("show qos tc-queue").await.unwrap();
    assert_eq!(out, "");
}
