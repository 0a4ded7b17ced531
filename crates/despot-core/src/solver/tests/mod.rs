mod support;

mod search_tests;
