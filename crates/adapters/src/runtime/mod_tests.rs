// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scoped_name_prefixes_with_app_id() {
    assert_eq!(scoped_name(AppId::new(1001), "backend"), "1001_backend");
}
