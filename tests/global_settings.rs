//! Process-wide default settings
//!
//! Kept in its own test binary: changing the default would race with any
//! other test reading through a session without explicit settings.

use tursomap::prelude::*;

#[derive(Debug, Default, PartialEq, FromRow)]
pub struct Rental {
    pub rental_id: i64,
    #[tursomap(rename = "ReturnDate")]
    pub returned:  Option<String>,
}

#[tokio::test]
async fn test_global_default_applies_to_later_reads() {
    let db = Builder::new_local(":memory:").build().await.unwrap();
    let conn = db.connect().unwrap();
    let session = conn.session();
    let sql = "SELECT 7 AS rental_id, '2005-05-26' AS return_date";

    let before: Rental = session.single(sql, ()).await.unwrap();
    assert_eq!(before, Rental { rental_id: 7, returned: None });

    Settings::update_global(|settings| *settings = settings.clone().with_name_transform(NameTransform::SnakeCase));
    let after: Rental = session.single(sql, ()).await.unwrap();
    assert_eq!(after, Rental { rental_id: 7, returned: Some("2005-05-26".to_string()) });

    let pinned: Rental = session.clone().with_settings(Settings::new()).single(sql, ()).await.unwrap();
    assert_eq!(pinned.returned, None);

    Settings::set_global(Settings::new());
    assert_eq!(Settings::global().name_transform(), NameTransform::None);
}
