mod article_tests;
