//! Behavioral scenarios shared by both backends.
//!
//! Each function drives one property through a transaction manager or a
//! booking service, so the relational and the document backend are held to
//! the same observable behavior.

use uuid::Uuid;

use booking_core::error::{
    BookingError, RepositoryError, TransactionError, UnitOfWorkError,
};
use booking_core::model::{Client, Reservation};
use booking_core::{BookingService, TransactionManager};

use super::date;

fn expect_duplicate(err: UnitOfWorkError) {
    assert!(
        matches!(
            err,
            UnitOfWorkError::Transaction(TransactionError::Repository(
                RepositoryError::DuplicateKey(_)
            ))
        ),
        "expected a duplicate key failure, got {err:?}"
    );
}

fn expect_update_conflict(err: UnitOfWorkError) {
    assert!(
        matches!(
            err,
            UnitOfWorkError::Transaction(TransactionError::Repository(
                RepositoryError::UpdateConflict(_)
            ))
        ),
        "expected an update conflict, got {err:?}"
    );
}

pub async fn repository_assigns_identifier_on_insert<M: TransactionManager>(tm: &M) {
    let saved = tm
        .in_client_transaction(|clients| async move {
            Ok(clients.save(Client::new("Mario", "Rossi")).await?)
        })
        .await
        .unwrap();
    let id = saved.id.expect("an identifier must be assigned on insert");

    let found = tm
        .in_client_transaction(move |clients| async move {
            Ok(clients.find_by_id(id).await?)
        })
        .await
        .unwrap()
        .expect("the committed client must be visible");
    assert_eq!(found, Client::with_id(id, "Mario", "Rossi"));
}

pub async fn repository_rejects_duplicate_client_names<M: TransactionManager>(tm: &M) {
    tm.in_client_transaction(|clients| async move {
        clients.save(Client::new("Mario", "Rossi")).await?;
        Ok(())
    })
    .await
    .unwrap();

    let err = tm
        .in_client_transaction(|clients| async move {
            clients.save(Client::new("Mario", "Rossi")).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    expect_duplicate(err);

    let all = tm
        .in_client_transaction(|clients| async move { Ok(clients.find_all().await?) })
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

pub async fn repository_rejects_duplicate_dates<M: TransactionManager>(tm: &M) {
    let when = date(2023, 4, 24);
    let (first_client, second_client) = tm
        .in_client_transaction(|clients| async move {
            let a = clients.save(Client::new("Mario", "Rossi")).await?;
            let b = clients.save(Client::new("Luigi", "Bianchi")).await?;
            Ok((a.id.unwrap(), b.id.unwrap()))
        })
        .await
        .unwrap();

    tm.in_reservation_transaction(move |reservations| async move {
        reservations
            .save(Reservation::new(first_client, when))
            .await?;
        Ok(())
    })
    .await
    .unwrap();

    // The date is taken system wide, even for a different client.
    let err = tm
        .in_reservation_transaction(move |reservations| async move {
            reservations
                .save(Reservation::new(second_client, when))
                .await?;
            Ok(())
        })
        .await
        .unwrap_err();
    expect_duplicate(err);

    let all = tm
        .in_reservation_transaction(|reservations| async move {
            Ok(reservations.find_all().await?)
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].client_id, first_client);
}

pub async fn repository_updates_preserve_identity<M: TransactionManager>(tm: &M) {
    let saved = tm
        .in_client_transaction(|clients| async move {
            Ok(clients.save(Client::new("Mario", "Rossi")).await?)
        })
        .await
        .unwrap();
    let id = saved.id.unwrap();

    let renamed = tm
        .in_client_transaction(move |clients| async move {
            Ok(clients.save(Client::with_id(id, "Maria", "Rossi")).await?)
        })
        .await
        .unwrap();
    assert_eq!(renamed.id, Some(id));

    let by_new_name = tm
        .in_client_transaction(|clients| async move {
            Ok(clients.find_by_name("Maria", "Rossi").await?)
        })
        .await
        .unwrap()
        .expect("the renamed client must be found under the new name");
    assert_eq!(by_new_name.id, Some(id));

    let by_old_name = tm
        .in_client_transaction(|clients| async move {
            Ok(clients.find_by_name("Mario", "Rossi").await?)
        })
        .await
        .unwrap();
    assert_eq!(by_old_name, None);
}

pub async fn repository_conflicts_on_vanished_records<M: TransactionManager>(tm: &M) {
    let phantom = Uuid::new_v4();

    let err = tm
        .in_client_transaction(move |clients| async move {
            clients
                .save(Client::with_id(phantom, "Mario", "Rossi"))
                .await?;
            Ok(())
        })
        .await
        .unwrap_err();
    expect_update_conflict(err);

    let err = tm
        .in_client_transaction(move |clients| async move {
            clients.delete(phantom).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    expect_update_conflict(err);
}

pub async fn repository_lookups_tolerate_blank_inputs<M: TransactionManager>(tm: &M) {
    let (by_name, by_id, by_client) = tm
        .in_transaction(|clients, reservations| async move {
            let by_name = clients.find_by_name("", "Rossi").await?;
            let by_id = clients.find_by_id(Uuid::nil()).await?;
            let by_client = reservations.find_by_client(Uuid::nil()).await?;
            Ok((by_name, by_id, by_client))
        })
        .await
        .unwrap();
    assert_eq!(by_name, None);
    assert_eq!(by_id, None);
    assert!(by_client.is_empty());
}

pub async fn repository_reports_missing_fields<M: TransactionManager>(tm: &M) {
    let err = tm
        .in_client_transaction(|clients| async move {
            clients.save(Client::new("", "Rossi")).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UnitOfWorkError::Transaction(TransactionError::Repository(
            RepositoryError::MissingField(_)
        ))
    ));
}

pub async fn rolled_back_writes_leave_no_trace<M: TransactionManager>(tm: &M) {
    let err = tm
        .in_client_transaction(|clients| async move {
            clients.save(Client::new("Mario", "Rossi")).await?;
            Err::<(), _>(BookingError::InvalidRequest("abort this unit of work".into()).into())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, UnitOfWorkError::Business(_)));

    let found = tm
        .in_client_transaction(|clients| async move {
            Ok(clients.find_by_name("Mario", "Rossi").await?)
        })
        .await
        .unwrap();
    assert_eq!(found, None, "a rolled back insert must not be visible");
}

pub async fn service_client_lifecycle<M: TransactionManager>(service: &BookingService<M>) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let id = mario.id.expect("insert must assign an identifier");

    let err = service.insert_new_client("Mario", "Rossi").await.unwrap_err();
    assert!(matches!(err, BookingError::ClientAlreadyExists { .. }));

    let all = service.all_clients().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(id));

    let found = service.find_client(id).await.unwrap();
    assert_eq!(found, mario);

    let named = service.find_client_named("Mario", "Rossi").await.unwrap();
    assert_eq!(named, mario);

    let err = service
        .find_client_named("Luigi", "Bianchi")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NoClientNamed { .. }));

    let err = service.find_client(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
}

pub async fn service_reservation_lifecycle<M: TransactionManager>(service: &BookingService<M>) {
    let when = date(2023, 4, 24);
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let luigi = service.insert_new_client("Luigi", "Bianchi").await.unwrap();
    let mario_id = mario.id.unwrap();
    let luigi_id = luigi.id.unwrap();

    let reservation = service
        .insert_new_reservation(mario_id, when)
        .await
        .unwrap();
    assert!(reservation.id.is_some());
    assert_eq!(reservation.client_id, mario_id);

    // Same date for another client: the date is taken system wide.
    let err = service
        .insert_new_reservation(luigi_id, when)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DateAlreadyBooked(_)));

    let on_date = service.find_reservation_on(when).await.unwrap();
    assert_eq!(on_date, reservation);
    assert_eq!(service.all_reservations().await.unwrap().len(), 1);

    let err = service
        .find_reservation_on(date(2023, 4, 25))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NoReservationOn(_)));

    // A reservation needs an existing owner.
    let err = service
        .insert_new_reservation(Uuid::new_v4(), date(2023, 4, 26))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
    assert_eq!(service.all_reservations().await.unwrap().len(), 1);
}

pub async fn service_rename_preserves_identity<M: TransactionManager>(
    service: &BookingService<M>,
) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let luigi = service.insert_new_client("Luigi", "Bianchi").await.unwrap();
    let mario_id = mario.id.unwrap();

    let err = service
        .rename_client(mario_id, "Luigi", "Bianchi")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ClientAlreadyExists { .. }));

    // Both records unchanged after the rejected rename.
    assert_eq!(service.find_client(mario_id).await.unwrap(), mario);
    assert_eq!(
        service.find_client(luigi.id.unwrap()).await.unwrap(),
        luigi
    );

    let renamed = service
        .rename_client(mario_id, "Maria", "Rossi")
        .await
        .unwrap();
    assert_eq!(renamed.id, Some(mario_id));
    assert_eq!(renamed.first_name, "Maria");

    let err = service
        .rename_client(Uuid::new_v4(), "Anna", "Verdi")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
}

pub async fn service_reschedule_preserves_identity<M: TransactionManager>(
    service: &BookingService<M>,
) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let mario_id = mario.id.unwrap();
    let first = service
        .insert_new_reservation(mario_id, date(2023, 4, 24))
        .await
        .unwrap();
    let second = service
        .insert_new_reservation(mario_id, date(2023, 4, 25))
        .await
        .unwrap();
    let second_id = second.id.unwrap();

    let err = service
        .reschedule_reservation(second_id, date(2023, 4, 24))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DateAlreadyBooked(_)));

    // Both reservations unchanged after the rejected reschedule.
    assert_eq!(
        service.find_reservation(first.id.unwrap()).await.unwrap(),
        first
    );
    assert_eq!(service.find_reservation(second_id).await.unwrap(), second);

    let moved = service
        .reschedule_reservation(second_id, date(2023, 5, 1))
        .await
        .unwrap();
    assert_eq!(moved.id, Some(second_id));
    assert_eq!(moved.date, date(2023, 5, 1));

    let err = service
        .reschedule_reservation(Uuid::new_v4(), date(2023, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ReservationNotFound(_)));
}

pub async fn service_delete_client_cascades<M: TransactionManager>(
    service: &BookingService<M>,
) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let luigi = service.insert_new_client("Luigi", "Bianchi").await.unwrap();
    let mario_id = mario.id.unwrap();
    let luigi_id = luigi.id.unwrap();

    service
        .insert_new_reservation(mario_id, date(2023, 4, 24))
        .await
        .unwrap();
    service
        .insert_new_reservation(mario_id, date(2023, 4, 25))
        .await
        .unwrap();
    let kept = service
        .insert_new_reservation(luigi_id, date(2023, 4, 26))
        .await
        .unwrap();

    service.delete_client(mario_id).await.unwrap();

    let err = service.find_client(mario_id).await.unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
    assert_eq!(service.all_reservations().await.unwrap(), vec![kept]);

    let err = service.delete_client(mario_id).await.unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
}

pub async fn service_lists_reservations_per_client<M: TransactionManager>(
    service: &BookingService<M>,
) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let luigi = service.insert_new_client("Luigi", "Bianchi").await.unwrap();
    let mario_id = mario.id.unwrap();
    let luigi_id = luigi.id.unwrap();

    let first = service
        .insert_new_reservation(mario_id, date(2023, 4, 24))
        .await
        .unwrap();
    let second = service
        .insert_new_reservation(mario_id, date(2023, 4, 25))
        .await
        .unwrap();
    service
        .insert_new_reservation(luigi_id, date(2023, 4, 26))
        .await
        .unwrap();

    let of_mario = service.reservations_of(mario_id).await.unwrap();
    assert_eq!(of_mario, vec![first, second]);

    let err = service.reservations_of(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BookingError::ClientNotFound(_)));
}

pub async fn service_deletes_single_reservations<M: TransactionManager>(
    service: &BookingService<M>,
) {
    let mario = service.insert_new_client("Mario", "Rossi").await.unwrap();
    let reservation = service
        .insert_new_reservation(mario.id.unwrap(), date(2023, 4, 24))
        .await
        .unwrap();
    let id = reservation.id.unwrap();

    service.delete_reservation(id).await.unwrap();
    assert!(service.all_reservations().await.unwrap().is_empty());

    let err = service.delete_reservation(id).await.unwrap_err();
    assert!(matches!(err, BookingError::ReservationNotFound(_)));
}
