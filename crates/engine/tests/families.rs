use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AddFamilyMemberCmd, AuditAction, AuditSubject, Engine, EngineError, FamilyRelationship, Gender,
    RecordStatus, RegisterMemberCmd,
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

async fn make_staff(db: &DatabaseConnection, member_id: Uuid) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE members SET is_staff = 1 WHERE id = ?",
        vec![member_id.to_string().into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn add_and_list_family_members() {
    let (engine, _db) = engine_with_db().await;
    let member = register(&engine, "Abebe Kebede", "0911000001").await;

    let partner = engine
        .add_family_member(
            AddFamilyMemberCmd::new(
                member,
                member,
                "Hirut Bekele",
                Gender::Female,
                FamilyRelationship::Partner,
            )
            .profession("nurse"),
        )
        .await
        .unwrap();
    assert_eq!(partner.member_id, member);
    assert_eq!(partner.status, RecordStatus::Active);
    assert_eq!(partner.profession.as_deref(), Some("nurse"));

    engine
        .add_family_member(AddFamilyMemberCmd::new(
            member,
            member,
            "Kebede Abebe",
            Gender::Male,
            FamilyRelationship::Child,
        ))
        .await
        .unwrap();

    let family = engine.family_members(member, member).await.unwrap();
    assert_eq!(family.len(), 2);
    assert_eq!(family[0].full_name, "Hirut Bekele");
    assert_eq!(family[0].relationship, FamilyRelationship::Partner);
    assert_eq!(family[1].full_name, "Kebede Abebe");
    assert_eq!(family[1].relationship, FamilyRelationship::Child);
}

#[tokio::test]
async fn add_family_member_requires_full_name() {
    let (engine, _db) = engine_with_db().await;
    let member = register(&engine, "Abebe Kebede", "0911000001").await;

    let err = engine
        .add_family_member(AddFamilyMemberCmd::new(
            member,
            member,
            "   ",
            Gender::Female,
            FamilyRelationship::Parent,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn add_family_member_rejects_unknown_member() {
    let (engine, _db) = engine_with_db().await;
    let member = register(&engine, "Abebe Kebede", "0911000001").await;

    let err = engine
        .add_family_member(AddFamilyMemberCmd::new(
            Uuid::new_v4(),
            member,
            "Hirut Bekele",
            Gender::Female,
            FamilyRelationship::Partner,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn family_rows_are_member_owned() {
    let (engine, db) = engine_with_db().await;
    let owner = register(&engine, "Abebe Kebede", "0911000001").await;
    let other = register(&engine, "Mulu Alem", "0911000002").await;

    let child = engine
        .add_family_member(AddFamilyMemberCmd::new(
            owner,
            owner,
            "Kebede Abebe",
            Gender::Male,
            FamilyRelationship::Child,
        ))
        .await
        .unwrap();

    // Another member can neither add to nor read the owner's list.
    let err = engine
        .add_family_member(AddFamilyMemberCmd::new(
            owner,
            other,
            "Hirut Bekele",
            Gender::Female,
            FamilyRelationship::Partner,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Forbidden("staff role required".to_string()));

    let err = engine.family_members(owner, other).await.unwrap_err();
    assert_eq!(err, EngineError::Forbidden("staff role required".to_string()));

    let err = engine
        .deactivate_family_member(child.id, other)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Forbidden("staff role required".to_string()));

    // Staff see and manage any member's list.
    make_staff(&db, other).await;
    let family = engine.family_members(owner, other).await.unwrap();
    assert_eq!(family.len(), 1);
}

#[tokio::test]
async fn deactivate_family_member_drops_from_list() {
    let (engine, _db) = engine_with_db().await;
    let member = register(&engine, "Abebe Kebede", "0911000001").await;

    let child = engine
        .add_family_member(AddFamilyMemberCmd::new(
            member,
            member,
            "Kebede Abebe",
            Gender::Male,
            FamilyRelationship::Child,
        ))
        .await
        .unwrap();

    let disabled = engine
        .deactivate_family_member(child.id, member)
        .await
        .unwrap();
    assert_eq!(disabled.status, RecordStatus::NotActive);

    let family = engine.family_members(member, member).await.unwrap();
    assert!(family.is_empty());

    // Repeat deactivation is a no-op.
    let again = engine
        .deactivate_family_member(child.id, member)
        .await
        .unwrap();
    assert_eq!(again.status, RecordStatus::NotActive);
    assert_eq!(again.updated_at, disabled.updated_at);
}

#[tokio::test]
async fn family_changes_are_audited() {
    let (engine, _db) = engine_with_db().await;
    let member = register(&engine, "Abebe Kebede", "0911000001").await;

    let child = engine
        .add_family_member(AddFamilyMemberCmd::new(
            member,
            member,
            "Kebede Abebe",
            Gender::Male,
            FamilyRelationship::Child,
        ))
        .await
        .unwrap();
    engine
        .deactivate_family_member(child.id, member)
        .await
        .unwrap();

    let trail = engine
        .audit_trail(AuditSubject::Family {
            family_id: child.id,
        })
        .await
        .unwrap();
    assert_eq!(trail.len(), 2);
    assert!(trail.iter().any(|e| e.action == AuditAction::Created));
    assert!(trail.iter().any(|e| e.action == AuditAction::Disabled));
    assert!(trail.iter().all(|e| e.performed_by == member));
}
