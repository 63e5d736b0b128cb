use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection};

use engine::{
    AssignmentTarget, Bank, CreateAssociationCmd, CreateFeeCmd, DepositFilter, Engine,
    EngineError, FeeCategory, FeeOutcome, MembershipStatus, MoneyCents, PayFeesCmd,
    RegisterMemberCmd, ReviewMembershipCmd, TransactionType, WithdrawCmd, banks,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn register(engine: &Engine, name: &str, phone: &str) -> Uuid {
    engine
        .register_member(RegisterMemberCmd::new(name, phone, "pw"))
        .await
        .unwrap()
        .id
}

async fn association_with_members(engine: &Engine, count: usize) -> (Uuid, Uuid, Vec<Uuid>) {
    let creator = register(engine, "Abebe Kebede", "0911000000").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    let mut members = Vec::with_capacity(count);
    for i in 0..count {
        let member = register(
            engine,
            &format!("Member {}", i + 1),
            &format!("0911{:06}", i + 1),
        )
        .await;
        engine
            .join_association(association.id, member)
            .await
            .unwrap();
        engine
            .review_membership(ReviewMembershipCmd::new(
                association.id,
                member,
                creator,
                MembershipStatus::Active,
            ))
            .await
            .unwrap();
        members.push(member);
    }
    (association.id, creator, members)
}

async fn deposit_fee(
    engine: &Engine,
    association_id: Uuid,
    creator: Uuid,
    name: &str,
    amount: i64,
) -> FeeOutcome {
    engine
        .create_fee(CreateFeeCmd::new(
            association_id,
            creator,
            name,
            FeeCategory::MonthlyFee,
            MoneyCents::new(amount),
        ))
        .await
        .unwrap()
}

fn assignment_of(outcome: &FeeOutcome, member_id: Uuid) -> Uuid {
    outcome
        .assignments
        .iter()
        .find(|a| a.member_id() == Some(member_id))
        .unwrap()
        .id
}

fn march(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap()
}

#[tokio::test]
async fn unpaid_fees_sum_open_obligations() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;

    deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;
    let roof = deposit_fee(&engine, association_id, creator, "Roof repair", 100_000).await;

    let summary = engine
        .unpaid_fees(association_id, members[0], members[0])
        .await
        .unwrap();
    assert_eq!(summary.total, MoneyCents::new(120_000));
    assert_eq!(summary.entries.len(), 2);
    assert_eq!(summary.entries[0].fee.name, "Roof repair");

    engine
        .pay_fees(PayFeesCmd::new(
            members[0],
            vec![assignment_of(&roof, members[0])],
            "cash",
        ))
        .await
        .unwrap();

    let summary = engine
        .unpaid_fees(association_id, members[0], members[0])
        .await
        .unwrap();
    assert_eq!(summary.total, MoneyCents::new(20_000));
    assert_eq!(summary.entries.len(), 1);
}

#[tokio::test]
async fn covered_members_owe_nothing() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;

    engine
        .create_fee(
            CreateFeeCmd::new(
                association_id,
                creator,
                "Monthly dues",
                FeeCategory::MonthlyFee,
                MoneyCents::new(20_000),
            )
            .supported_member(members[0]),
        )
        .await
        .unwrap();

    let covered = engine
        .unpaid_fees(association_id, members[0], members[0])
        .await
        .unwrap();
    assert_eq!(covered.total, MoneyCents::ZERO);
    assert!(covered.entries.is_empty());

    let owing = engine
        .unpaid_fees(association_id, members[1], members[1])
        .await
        .unwrap();
    assert_eq!(owing.total, MoneyCents::new(20_000));
}

#[tokio::test]
async fn deactivated_fees_leave_the_unpaid_list() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;

    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;
    engine
        .deactivate_fee(outcome.fee.id, creator)
        .await
        .unwrap();

    let summary = engine
        .unpaid_fees(association_id, members[0], members[0])
        .await
        .unwrap();
    assert_eq!(summary.total, MoneyCents::ZERO);
    assert!(summary.entries.is_empty());
}

#[tokio::test]
async fn deposits_group_per_member() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![assignment_of(&outcome, members[0])], "cash")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    engine
        .pay_fees(
            PayFeesCmd::new(
                members[1],
                vec![assignment_of(&outcome, members[1])],
                "telebirr",
            )
            .paid_at(march(10)),
        )
        .await
        .unwrap();

    let groups = engine
        .deposits(association_id, DepositFilter::default(), creator)
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(
        groups[0].target,
        AssignmentTarget::Member {
            member_id: members[0]
        }
    );
    assert_eq!(groups[0].member_name.as_deref(), Some("Member 1"));
    assert_eq!(groups[0].total, MoneyCents::new(20_000));
    assert_eq!(groups[0].items.len(), 1);
    assert_eq!(groups[0].items[0].method.as_deref(), Some("cash"));

    assert_eq!(groups[1].member_name.as_deref(), Some("Member 2"));
}

#[tokio::test]
async fn deposits_apply_method_and_date_filters() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![assignment_of(&outcome, members[0])], "cash")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    engine
        .pay_fees(
            PayFeesCmd::new(
                members[1],
                vec![assignment_of(&outcome, members[1])],
                "telebirr",
            )
            .paid_at(march(10)),
        )
        .await
        .unwrap();

    let by_method = engine
        .deposits(
            association_id,
            DepositFilter {
                method: Some("cash".to_string()),
                date: None,
            },
            creator,
        )
        .await
        .unwrap();
    assert_eq!(by_method.len(), 1);
    assert_eq!(by_method[0].member_name.as_deref(), Some("Member 1"));

    let by_date = engine
        .deposits(
            association_id,
            DepositFilter {
                method: None,
                date: NaiveDate::from_ymd_opt(2026, 3, 10),
            },
            creator,
        )
        .await
        .unwrap();
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date[0].member_name.as_deref(), Some("Member 2"));

    let err = engine
        .deposits(
            association_id,
            DepositFilter {
                method: Some("cbe".to_string()),
                date: None,
            },
            creator,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("no deposits recorded".to_string())
    );
}

#[tokio::test]
async fn deposits_require_committee() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, _creator, members) = association_with_members(&engine, 1).await;

    let err = engine
        .deposits(association_id, DepositFilter::default(), members[0])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("committee role required".to_string())
    );
}

#[tokio::test]
async fn deposit_summary_folds_day_and_method() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![assignment_of(&outcome, members[0])], "cash")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    engine
        .pay_fees(
            PayFeesCmd::new(members[1], vec![assignment_of(&outcome, members[1])], "cash")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    engine
        .pay_fees(
            PayFeesCmd::new(creator, vec![assignment_of(&outcome, creator)], "telebirr")
                .paid_at(march(10)),
        )
        .await
        .unwrap();

    let rows = engine
        .deposit_summary(association_id, None, creator)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].day, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    assert_eq!(rows[0].method, "telebirr");
    assert_eq!(rows[0].total, MoneyCents::new(20_000));
    assert_eq!(rows[0].count, 1);

    assert_eq!(rows[1].day, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    assert_eq!(rows[1].method, "cash");
    assert_eq!(rows[1].total, MoneyCents::new(40_000));
    assert_eq!(rows[1].count, 2);

    let limited = engine
        .deposit_summary(association_id, Some(1), creator)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].method, "telebirr");
}

#[tokio::test]
async fn withdrawals_are_listed_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Hall rent",
            FeeCategory::Other,
            MoneyCents::new(50_000),
            AssignmentTarget::Association,
        ))
        .await
        .unwrap();
    engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Funeral support",
            FeeCategory::Other,
            MoneyCents::new(150_000),
            AssignmentTarget::Member {
                member_id: members[0],
            },
        ))
        .await
        .unwrap();

    let records = engine
        .list_withdrawals(association_id, None, members[0])
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].fee.name, "Funeral support");
    assert_eq!(records[0].assignments.len(), 1);
    assert_eq!(records[1].fee.name, "Hall rent");
}

#[tokio::test]
async fn payment_batch_itemizes_one_reference() {
    let (engine, db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    let bank = Bank::new(
        association_id,
        "CBE".to_string(),
        "Selam Edir".to_string(),
        "1000222333".to_string(),
    );
    banks::ActiveModel::from(&bank).insert(&db).await.unwrap();

    let ids = vec![
        assignment_of(&outcome, members[0]),
        assignment_of(&outcome, members[1]),
    ];
    let batch = engine
        .pay_fees(
            PayFeesCmd::new(creator, ids, "bank transfer")
                .bank_id(bank.id)
                .proof_image("receipts/march.png")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    let trx_ref = batch.trx_ref.unwrap();

    let detail = engine.payment_batch(&trx_ref, creator).await.unwrap();
    assert_eq!(detail.trx_ref, trx_ref);
    assert_eq!(detail.method.as_deref(), Some("bank transfer"));
    assert_eq!(detail.bank_name.as_deref(), Some("CBE"));
    assert_eq!(detail.proof_image.as_deref(), Some("receipts/march.png"));
    assert_eq!(detail.paid_at, Some(march(9)));
    assert_eq!(detail.total, MoneyCents::new(40_000));
    assert_eq!(detail.fees.len(), 2);
    assert!(detail.fees.iter().all(|f| f.name == "Monthly dues"));

    let err = engine.payment_batch("ZZZZZZZZZZZZ", creator).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("payment batch not exists".to_string())
    );
}

#[tokio::test]
async fn payment_batch_is_visible_to_participants() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;

    let batch = engine
        .pay_fees(PayFeesCmd::new(
            members[0],
            vec![assignment_of(&outcome, members[0])],
            "cash",
        ))
        .await
        .unwrap();
    let trx_ref = batch.trx_ref.unwrap();

    assert!(engine.payment_batch(&trx_ref, members[0]).await.is_ok());
    assert!(engine.payment_batch(&trx_ref, creator).await.is_ok());

    let err = engine
        .payment_batch(&trx_ref, members[1])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("committee role required".to_string())
    );
}

#[tokio::test]
async fn member_payments_group_batches_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let dues = deposit_fee(&engine, association_id, creator, "Monthly dues", 20_000).await;
    let roof = deposit_fee(&engine, association_id, creator, "Roof repair", 100_000).await;

    engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![assignment_of(&dues, members[0])], "cash")
                .paid_at(march(9)),
        )
        .await
        .unwrap();
    let later = engine
        .pay_fees(
            PayFeesCmd::new(
                members[0],
                vec![assignment_of(&roof, members[0])],
                "telebirr",
            )
            .paid_at(march(10)),
        )
        .await
        .unwrap();

    let groups = engine
        .member_payments(association_id, members[0], None, members[0])
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].trx_ref, later.trx_ref.unwrap());
    assert_eq!(groups[0].total, MoneyCents::new(100_000));
    assert_eq!(groups[0].fee_count, 1);
    assert_eq!(groups[0].transaction_type, TransactionType::Deposit);
    assert_eq!(groups[1].total, MoneyCents::new(20_000));

    let limited = engine
        .member_payments(association_id, members[0], Some(1), members[0])
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].total, MoneyCents::new(100_000));

    assert!(
        engine
            .member_payments(association_id, members[0], None, creator)
            .await
            .is_ok()
    );
}
