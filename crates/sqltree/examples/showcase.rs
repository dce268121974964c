//! Statement tree showcase for sqltree
//!
//! Run with: cargo run --example showcase -p sqltree

use sqltree::prelude::*;
use sqltree::{Alias, Func};

fn join_articles(q: Query, u: &Alias) -> (Query, Alias) {
    let a = table("article").alias();
    let q = q.join(&a, a.f("user_id").eq(u.f("id")));
    (q, a)
}

fn fixed_json_agg(e: Expr) -> Expr {
    let coalesce = Func::new("COALESCE");
    let nullif = Func::new("NULLIF");
    let json_agg = Func::new("json_agg");
    coalesce
        .call([
            nullif.call([json_agg.call([e]).cast("TEXT"), literal("'[null]'")]),
            literal("'[]'"),
        ])
        .cast("JSON")
}

fn show(title: &str, built: BuiltQuery) {
    println!("=== {title} ===");
    println!("{}", built.sql);
    if !built.params.is_empty() {
        println!("params: {:?}", built.params);
    }
    println!();
}

fn main() -> Result<(), BuildError> {
    let user = table("user");
    let article = table("article");

    show("Table", user.build()?);

    show(
        "Select from",
        query().select([user.star()]).from([&user]).build()?,
    );

    let a = article.alias();
    show(
        "Aliases",
        query().distinct().select([a.f("user_id")]).from([&a]).build()?,
    );

    let u1 = user.alias();
    let u2 = user.alias();
    show(
        "Join",
        query()
            .select([u1.f("id"), u2.f("id")])
            .from([&u1])
            .left_join(&u2, u1.f("name").eq(u2.f("name")))
            .build()?,
    );

    let a = article.alias();
    show(
        "Params",
        query()
            .select([a.f("title")])
            .from([&a])
            .and_where(a.f("user_id").eq(123))
            .build()?,
    );

    let a = article.alias();
    show(
        "Literals",
        query().from([&a]).and_where(a.f("id").eq(literal(123))).build()?,
    );

    let a = article.alias();
    show(
        "Functions",
        query()
            .select([count(a.f("user_id").distinct())])
            .from([&a])
            .build()?,
    );

    let u = user.alias();
    show(
        "Lists",
        query().from([&u]).and_where(u.f("id").in_list([2, 4, 6])).build()?,
    );

    let u = user.alias();
    let (q, a) = join_articles(query().distinct().from([&u]), &u);
    show(
        "Composing",
        q.and_where(a.f("title").like("%foo%")).build()?,
    );

    let u = user.alias();
    let email = param("foo@foo");
    show(
        "Sharing parameters",
        query()
            .from([&u])
            .and_where(u.f("login").eq(&email).or(u.f("contact").eq(&email)))
            .build()?,
    );

    // Custom functions
    let st_distance = func("ST_Distance");
    let st_set_srid = func("ST_SetSRID");
    let st_point = func("ST_POINT");
    let (lat, lng) = (41.90278, 12.49636);

    let u = user.alias();
    let a = article.alias();
    let q = query()
        .select(args![u.star(), fixed_json_agg(a.star()).alias_as("articles")])
        .from([&u])
        .join(&a, a.f("user_id").eq(u.f("id")))
        .group([u.f("id")])
        .order(u.f("name"))
        .limit(10);

    let point = st_set_srid.call(args![st_point.call(args![lng, lat]), 4326]);
    let distance = st_distance.call(args![point, u.f("address"), true]);
    let q = q
        .select([distance.clone().alias_as("distance")])
        .and_where(distance.le(200));
    show("Complex example", q.build()?);

    show(
        "Insert",
        insert(&user)
            .set_many([("name", "foo")])
            .set("bio", "some info")
            .returning(["id"])
            .build()?,
    );
    show(
        "Update",
        update(&user)
            .set("bio", "some info here")
            .and_where(user.f("id").eq(321))
            .build()?,
    );

    match delete_from(&user).build() {
        Ok(built) => show("Delete", built),
        Err(e) => println!("=== Delete ===\n{e}\n"),
    }

    Ok(())
}
